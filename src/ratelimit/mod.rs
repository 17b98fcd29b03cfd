//! Rate Limiting Module
//!
//! Per-IP request budgets for the detection endpoints. `/health`, `/hash`
//! and the admin routes are exempt.
//!
//! The limiter is a fixed window per client: the first request in a window
//! starts the clock, and the counter resets once the window has elapsed.
//! The documented behavior is "100 requests per minute".

pub mod limiter;

pub use limiter::RateLimiter;
