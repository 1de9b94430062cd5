use log::LevelFilter;

pub const DEFAULT_AGENT_LEVEL_FILTER: LevelFilter = LevelFilter::Info;
