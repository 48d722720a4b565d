#[path = "workflows/listing_tests.rs"]
mod listing_tests;
#[path = "workflows/ownership_tests.rs"]
mod ownership_tests;
#[path = "workflows/playlist_tests.rs"]
mod playlist_tests;
#[path = "workflows/projection_tests.rs"]
mod projection_tests;
#[path = "workflows/support.rs"]
mod support;
#[path = "workflows/toggle_tests.rs"]
mod toggle_tests;
