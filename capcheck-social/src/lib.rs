//! Social network clients used by capcheck.
//!
//! Only the Twitter/X read path is implemented: a single-tweet lookup plus the
//! image-selection logic that turns a lookup response into a candidate image URL.
pub mod twitter;
