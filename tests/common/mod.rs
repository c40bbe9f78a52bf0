#![allow(dead_code, unused_imports)]

pub use tripline_test_utils::builders;
pub use tripline_test_utils::fake_action;
pub use tripline_test_utils::recorder;
pub use tripline_test_utils::{init_tracing, with_timeout};
