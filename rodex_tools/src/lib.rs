pub mod colors;
pub mod icons;
pub mod itemdb;
pub mod quests;
pub mod search;
pub mod sprite;
