// tests/payload_passthrough.rs

#![cfg(unix)]

mod common;
use crate::common::{HandlerCall, RecordingHandler, TaskDefinitionBuilder, supervisor};

use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Whatever single-line payload goes in on stdin comes back unchanged as
    /// the response.
    #[test]
    fn stdin_payload_round_trips_through_child(payload in "[a-zA-Z0-9 {}\\[\\]\":,._/-]{1,80}") {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let calls = rt.block_on(async {
            let task = TaskDefinitionBuilder::shell("echo '-=result=-'; cat").build();
            let mut handler = RecordingHandler::new("prop", &payload);
            supervisor(task).execute(&mut handler).await;
            handler.calls()
        });

        prop_assert_eq!(calls.last(), Some(&HandlerCall::Success(Some(payload.clone()))));
    }
}
