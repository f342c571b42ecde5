pub mod decoders;
pub mod imap_client;
pub mod search;
pub mod session;
