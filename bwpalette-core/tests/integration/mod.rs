mod session_store_tests;
mod totp_scheduler_tests;
mod vault_view_tests;
