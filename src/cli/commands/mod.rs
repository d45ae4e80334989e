pub mod agency;
pub mod db;
pub mod guard;
pub mod provision;
pub mod server;
pub mod subscription;
