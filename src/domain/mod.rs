pub mod backoff;
pub mod direction;
pub mod reading;
pub mod session_state;
