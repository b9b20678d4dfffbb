pub mod config;
pub mod encoding;
pub mod error;
pub mod export;
pub mod header_aliases;
pub mod integrity;
pub mod league_map;
pub mod table_extract;
pub mod team_record;
pub mod upload;
