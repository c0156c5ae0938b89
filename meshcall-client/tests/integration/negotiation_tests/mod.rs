mod test_early_candidates_are_applied_in_order;
mod test_existing_member_offers_to_newcomer;
mod test_negotiation_failure_is_isolated;
