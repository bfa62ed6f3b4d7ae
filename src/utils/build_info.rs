/// Compile-time build metadata produced by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildMetadata {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

impl BuildMetadata {
    /// Single-line description printed by `fincommand_cli version`.
    pub fn describe(&self) -> String {
        format!(
            "fincommand {} ({} {}, {} {}, built {})",
            self.version, self.git_hash, self.git_status, self.target, self.profile, self.timestamp
        )
    }
}

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn current() -> BuildMetadata {
    BuildMetadata {
        version: CLI_VERSION,
        git_hash: option_env!("FINCOMMAND_BUILD_HASH").unwrap_or("unknown"),
        git_status: option_env!("FINCOMMAND_BUILD_STATUS").unwrap_or("unknown"),
        timestamp: option_env!("FINCOMMAND_BUILD_TIMESTAMP").unwrap_or("unknown"),
        target: option_env!("FINCOMMAND_BUILD_TARGET").unwrap_or("unknown"),
        profile: option_env!("FINCOMMAND_BUILD_PROFILE").unwrap_or("unknown"),
        rustc: option_env!("FINCOMMAND_BUILD_RUSTC").unwrap_or("unknown"),
    }
}
