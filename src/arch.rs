use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::binfmt::Binfmt;
use crate::errors::{ParseArchError, Result};
use crate::shell::MessageInfo;

/// Root under which every architecture gets its standard sysroot.
pub const CROSS_ROOT: &str = "/var/ab/cross-root";

/// Hardware architectures supported by AOSC OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Architecture {
    Amd64,
    Arm64,
    Loongson3,
    Powerpc,
    Ppc64el,
    Riscv64,
    Mips64r6el,
    Armv4,
    Armv6hf,
    Armv7hf,
    M68k,
    // pre-POWER8 big endian
    Ppc64,
    I486,
}

impl Architecture {
    pub const ALL: [Architecture; 13] = [
        Architecture::Amd64,
        Architecture::Arm64,
        Architecture::Loongson3,
        Architecture::Powerpc,
        Architecture::Ppc64el,
        Architecture::Riscv64,
        Architecture::Mips64r6el,
        Architecture::Armv4,
        Architecture::Armv6hf,
        Architecture::Armv7hf,
        Architecture::M68k,
        Architecture::Ppc64,
        Architecture::I486,
    ];

    /// The distribution-facing name, as used in package and sysroot names.
    pub const fn name(self) -> &'static str {
        match self {
            Architecture::Amd64 => "amd64",
            Architecture::Arm64 => "arm64",
            Architecture::Loongson3 => "loongson3",
            Architecture::Powerpc => "powerpc",
            Architecture::Ppc64el => "ppc64el",
            Architecture::Riscv64 => "riscv64",
            Architecture::Mips64r6el => "mips64r6el",
            Architecture::Armv4 => "armv4",
            Architecture::Armv6hf => "armv6hf",
            Architecture::Armv7hf => "armv7hf",
            Architecture::M68k => "m68k",
            Architecture::Ppc64 => "ppc64",
            Architecture::I486 => "i486",
        }
    }

    /// Returns the architecture name in QEMU nomenclature
    pub const fn qemu_arch(self) -> &'static str {
        match self {
            Architecture::Amd64 => "amd64",
            Architecture::Arm64 => "aarch64",
            Architecture::Loongson3 | Architecture::Mips64r6el => "mips64el",
            Architecture::Powerpc => "ppc",
            Architecture::Ppc64el => "ppc64le",
            Architecture::Riscv64 => "riscv64",
            Architecture::Armv4 | Architecture::Armv6hf | Architecture::Armv7hf => "arm",
            Architecture::M68k => "m68k",
            Architecture::Ppc64 => "ppc64",
            Architecture::I486 => "i386",
        }
    }

    /// File name of the statically linked QEMU user emulator.
    pub fn qemu_bin(self) -> String {
        format!("qemu-{}-static", self.qemu_arch())
    }

    /// Legacy architectures, never reported by host detection.
    pub const fn is_retro(self) -> bool {
        matches!(
            self,
            Architecture::Armv4
                | Architecture::Armv6hf
                | Architecture::Armv7hf
                | Architecture::M68k
                | Architecture::Ppc64
        )
    }

    /// Maps a `uname -m` machine string onto an architecture.
    ///
    /// # Notes
    ///
    /// `mips64` could be either loongson3 or another MIPS64 flavor, so it
    /// yields `None` along with every retro or unknown machine.
    pub fn from_machine(machine: &str) -> Option<Architecture> {
        match machine {
            "x86_64" => Some(Architecture::Amd64),
            "aarch64" => Some(Architecture::Arm64),
            "riscv64" => Some(Architecture::Riscv64),
            "ppc" => Some(Architecture::Powerpc),
            "ppc64le" => Some(Architecture::Ppc64el),
            // loongson3 and mips64r6el both report this
            "mips64" => None,
            _ => None,
        }
    }

    /// Checks whether the running system is one of the possible targets.
    pub fn match_current_arch() -> Result<Option<Architecture>> {
        let uts = nix::sys::utsname::uname()?;
        Ok(uts.machine().to_str().and_then(Architecture::from_machine))
    }

    /// Standard sysroot location for AOSC OS.
    pub fn standard_sysroot(self) -> PathBuf {
        PathBuf::from(CROSS_ROOT).join(self.name())
    }

    /// Returns the path of the registered QEMU interpreter, or `None` if this
    /// architecture cannot be emulated through binfmt_misc.
    pub fn have_qemu(self, msg_info: &mut MessageInfo) -> Result<Option<PathBuf>> {
        Binfmt::default().have_qemu(self, msg_info)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Architecture {
    type Err = ParseArchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Architecture::ALL
            .into_iter()
            .find(|arch| arch.name() == s)
            .ok_or_else(|| ParseArchError(s.to_owned()))
    }
}

impl From<Architecture> for String {
    fn from(arch: Architecture) -> Self {
        arch.name().to_owned()
    }
}

impl TryFrom<String> for Architecture {
    type Error = ParseArchError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
