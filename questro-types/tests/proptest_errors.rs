//! Property-based tests: user-facing classification consistency.

use proptest::prelude::*;
use proptest::strategy::LazyJust;
use questro_types::*;
use std::time::Duration;

fn arb_chat_error() -> impl Strategy<Value = ChatError> {
    prop_oneof![
        any::<String>().prop_map(ChatError::RateLimited),
        any::<String>().prop_map(ChatError::QuotaExceeded),
        (400u16..600, any::<String>())
            .prop_map(|(status, message)| ChatError::Http { status, message }),
        (0u64..600).prop_map(|s| ChatError::Timeout(Duration::from_secs(s))),
        any::<String>().prop_map(|s| ChatError::Stream(StreamFailure::Read(s))),
        LazyJust::new(|| ChatError::Stream(StreamFailure::Truncated)),
        LazyJust::new(|| ChatError::Stream(StreamFailure::Cancelled)),
    ]
}

proptest! {
    #[test]
    fn user_message_is_never_empty(err in arb_chat_error()) {
        prop_assert!(!err.user_message().is_empty());
    }

    #[test]
    fn rate_limit_and_quota_are_distinct(err in arb_chat_error()) {
        prop_assert!(!(err.is_rate_limited() && err.is_quota_exceeded()));
        if err.is_rate_limited() {
            prop_assert_eq!(err.user_message(), RATE_LIMIT_MESSAGE);
        }
        if err.is_quota_exceeded() {
            prop_assert_eq!(err.user_message(), QUOTA_MESSAGE);
        }
    }
}
