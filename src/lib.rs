pub mod config;
pub mod game_identity;
pub mod game_record;
pub mod gamelog_dataset;
pub mod gamelog_parse;
pub mod http_cache;
pub mod http_client;
pub mod ingest;
pub mod team_summary;
pub mod teams;
