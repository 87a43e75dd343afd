pub use color_eyre::Section;
pub use eyre::WrapErr;
pub use eyre::Result;

/// Installs the `color-eyre` report hook.
///
/// Source locations are only shown in development builds or when
/// `ABCROSS_DEBUG` is set.
pub fn install_panic_hook() -> Result<()> {
    let is_dev = !crate::commit_info().is_empty() || std::env::var("ABCROSS_DEBUG").is_ok();
    color_eyre::config::HookBuilder::new()
        .display_env_section(false)
        .display_location_section(is_dev)
        .install()
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("could not execute `{command}`")]
    CouldNotExecute {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        command: String,
    },
    #[error("cannot run an empty command")]
    EmptyCommand,
}

/// An architecture name that is not one of the supported variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown architecture `{0}`")]
pub struct ParseArchError(pub String);
