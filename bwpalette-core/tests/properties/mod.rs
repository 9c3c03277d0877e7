mod countdown_tests;
mod payload_tests;
