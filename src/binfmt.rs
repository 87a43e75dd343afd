//! Inspection of the kernel's `binfmt_misc` registrations.
//!
//! Each registered handler is exposed as a file under the binfmt_misc
//! mount point, for example `/proc/sys/fs/binfmt_misc/qemu-aarch64`:
//!
//! ```text
//! enabled
//! interpreter /usr/bin/qemu-aarch64-static
//! flags: OCF
//! offset 0
//! magic 7f454c460201010000000000000000000200b700
//! mask ffffffffffffff00fffffffffffffffffeffffff
//! ```
//!
//! Nothing here registers or removes handlers, every operation only reads.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::arch::Architecture;
use crate::config::Config;
use crate::errors::*;
use crate::file;
use crate::shell::{self, MessageInfo};

pub const BINFMT_MISC: &str = "/proc/sys/fs/binfmt_misc";

/// A parsed handler descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinfmtEntry {
    pub enabled: bool,
    pub interpreter: Option<String>,
    pub flags: Option<String>,
    pub offset: Option<u64>,
    pub magic: Option<String>,
    pub mask: Option<String>,
    pub extension: Option<String>,
}

impl BinfmtEntry {
    /// Parses the text of a descriptor file.
    ///
    /// Only the first line decides `enabled`; unknown or malformed fields
    /// are skipped.
    pub fn parse(content: &str) -> BinfmtEntry {
        let mut lines = content.lines();
        let mut entry = BinfmtEntry {
            enabled: lines.next().map(str::trim) == Some("enabled"),
            ..BinfmtEntry::default()
        };

        for line in lines {
            let (key, value) = match line.split_once(' ') {
                Some((key, value)) => (key.trim_end_matches(':'), value.trim_end()),
                None => (line.trim_end_matches(':'), ""),
            };
            match key {
                "interpreter" if entry.interpreter.is_none() => {
                    entry.interpreter = Some(value.to_owned());
                }
                "flags" => entry.flags = Some(value.trim().to_owned()),
                "offset" => entry.offset = value.trim().parse().ok(),
                "magic" => entry.magic = Some(value.trim().to_owned()),
                "mask" => entry.mask = Some(value.trim().to_owned()),
                "extension" => entry.extension = Some(value.trim().to_owned()),
                _ => {}
            }
        }

        entry
    }

    /// Returns the registered interpreter if it names `base_name`, with at
    /// least one leading path character.
    pub fn interpreter_for(&self, base_name: &str) -> Option<&str> {
        self.interpreter
            .as_deref()
            .filter(|path| path.len() > base_name.len() && path.ends_with(base_name))
    }
}

/// Why an architecture cannot be emulated.
#[derive(Debug, thiserror::Error)]
pub enum Unavailable {
    #[error("architecture {arch} is not registered with binfmt: {error}")]
    NotRegistered {
        arch: Architecture,
        descriptor: PathBuf,
        error: io::Error,
    },
    #[error("architecture {arch} is not enabled with binfmt")]
    Disabled { arch: Architecture, content: String },
    #[error("architecture {arch} does not have a valid interpreter")]
    InvalidInterpreter { arch: Architecture, content: String },
    #[error("architecture {arch} has incorrect interpreter {registered} instead of {expected}")]
    WrongInterpreter {
        arch: Architecture,
        registered: String,
        resolved: PathBuf,
        expected: String,
    },
}

impl Unavailable {
    /// Descriptor content worth showing next to the error, if any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Unavailable::Disabled { content, .. }
            | Unavailable::InvalidInterpreter { content, .. } => Some(content),
            Unavailable::NotRegistered { .. } | Unavailable::WrongInterpreter { .. } => None,
        }
    }
}

/// A binfmt_misc mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binfmt {
    root: PathBuf,
}

impl Binfmt {
    pub fn new(root: impl Into<PathBuf>) -> Binfmt {
        Binfmt { root: root.into() }
    }

    pub fn from_config(config: &Config) -> Binfmt {
        Binfmt::new(config.binfmt_misc())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Checks if the host kernel has binfmt_misc support turned on.
    pub fn is_enabled(&self) -> Result<bool> {
        Ok(file::read(self.root.join("status"))?.trim() == "enabled")
    }

    /// Path of the descriptor QEMU registers for `arch`.
    pub fn descriptor(&self, arch: Architecture) -> PathBuf {
        self.root.join(format!("qemu-{}", arch.qemu_arch()))
    }

    /// Finds the interpreter the kernel will use for `arch` binaries.
    ///
    /// On success the interpreter path is returned with symbolic links
    /// resolved.
    pub fn probe(&self, arch: Architecture) -> Result<PathBuf, Unavailable> {
        let base_name = arch.qemu_bin();
        let descriptor = self.descriptor(arch);
        let content =
            fs::read_to_string(&descriptor).map_err(|error| Unavailable::NotRegistered {
                arch,
                descriptor: descriptor.clone(),
                error,
            })?;

        let entry = BinfmtEntry::parse(&content);
        if !entry.enabled {
            return Err(Unavailable::Disabled { arch, content });
        }

        let registered = match entry.interpreter_for(&base_name) {
            Some(path) => path,
            None => return Err(Unavailable::InvalidInterpreter { arch, content }),
        };

        let resolved = file::resolve(Path::new(registered));
        if resolved.file_name() != Some(OsStr::new(&base_name)) {
            return Err(Unavailable::WrongInterpreter {
                arch,
                registered: registered.to_owned(),
                resolved,
                expected: base_name,
            });
        }

        Ok(resolved)
    }

    /// Returns the interpreter path, or `None` after reporting why `arch`
    /// cannot be emulated.
    pub fn have_qemu(
        &self,
        arch: Architecture,
        msg_info: &mut MessageInfo,
    ) -> Result<Option<PathBuf>> {
        if msg_info.is_verbose() {
            msg_info.debug(format_args!(
                "checking binfmt descriptor {}",
                self.descriptor(arch).display()
            ))?;
        }

        match self.probe(arch) {
            Ok(interpreter) => Ok(Some(interpreter)),
            Err(unavailable) => {
                msg_info.error(&unavailable)?;
                match &unavailable {
                    Unavailable::NotRegistered { descriptor, .. } => {
                        msg_info.error(format_args!("looked for {}", descriptor.display()))?;
                    }
                    Unavailable::WrongInterpreter { resolved, .. } => {
                        msg_info
                            .error(format_args!("interpreter resolves to {}", resolved.display()))?;
                    }
                    Unavailable::Disabled { .. } | Unavailable::InvalidInterpreter { .. } => {}
                }
                if let Some(content) = unavailable.content() {
                    msg_info.error(format_args!(
                        "content of binfmt descriptor:\n{}",
                        shell::indent(content, shell::default_ident()).trim_end()
                    ))?;
                }
                Ok(None)
            }
        }
    }
}

impl Default for Binfmt {
    fn default() -> Binfmt {
        Binfmt::from_config(&Config::new())
    }
}
