//! Architecture alias tables and per-format architecture naming.

/// CPU architectures understood by the alias tables.
///
/// Descriptors name architectures the way Go toolchains do (`amd64`, `386`,
/// `arm64`, `arm7`, ...). Every packaging ecosystem spells them differently,
/// so each format asks for its own name through one of the `*_name` methods.
/// Strings that do not parse into a known architecture are passed through
/// untouched by [`translate`].
///
/// # Example
///
/// ```
/// use pakr_schema::{Arch, Format};
///
/// let arch: Arch = "amd64".parse().unwrap();
/// assert_eq!(arch.name_for(Format::Rpm), "x86_64");
/// assert_eq!(arch.name_for(Format::Deb), "amd64");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// Architecture-independent content (`all`).
    All,
    /// 32-bit x86 (`386`)
    I386,
    /// `x86_64` (`amd64`)
    Amd64,
    /// ARMv5 soft-float (`arm5`)
    Arm5,
    /// ARMv6 hard-float (`arm6`)
    Arm6,
    /// ARMv7 hard-float (`arm7`)
    Arm7,
    /// 64-bit ARM (`arm64`)
    Arm64,
    /// Little-endian MIPS (`mipsle`)
    Mipsle,
    /// Little-endian MIPS64 (`mips64le`)
    Mips64le,
    /// Little-endian POWER (`ppc64le`)
    Ppc64le,
    /// IBM Z (`s390x`)
    S390x,
    /// 64-bit RISC-V (`riscv64`)
    Riscv64,
}

/// The package formats that have their own architecture vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Red Hat `.rpm`
    Rpm,
    /// Debian `.deb`
    Deb,
    /// Alpine `.apk`
    Apk,
    /// Arch Linux `.pkg.tar.zst`
    ArchLinux,
}

impl Arch {
    /// Descriptor spelling of this architecture.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::I386 => "386",
            Self::Amd64 => "amd64",
            Self::Arm5 => "arm5",
            Self::Arm6 => "arm6",
            Self::Arm7 => "arm7",
            Self::Arm64 => "arm64",
            Self::Mipsle => "mipsle",
            Self::Mips64le => "mips64le",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
            Self::Riscv64 => "riscv64",
        }
    }

    /// RPM `%{_arch}` spelling.
    pub fn rpm_name(&self) -> &'static str {
        match self {
            Self::All => "noarch",
            Self::I386 => "i386",
            Self::Amd64 => "x86_64",
            Self::Arm5 => "armv5tel",
            Self::Arm6 => "armv6hl",
            Self::Arm7 => "armv7hl",
            Self::Arm64 => "aarch64",
            Self::Mipsle => "mipsel",
            Self::Mips64le => "mips64el",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
            Self::Riscv64 => "riscv64",
        }
    }

    /// `dpkg --print-architecture` spelling.
    pub fn deb_name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::I386 => "i386",
            Self::Amd64 => "amd64",
            Self::Arm5 => "armel",
            Self::Arm6 | Self::Arm7 => "armhf",
            Self::Arm64 => "arm64",
            Self::Mipsle => "mipsel",
            Self::Mips64le => "mips64el",
            Self::Ppc64le => "ppc64el",
            Self::S390x => "s390x",
            Self::Riscv64 => "riscv64",
        }
    }

    /// Alpine `apk --print-arch` spelling.
    pub fn apk_name(&self) -> &'static str {
        match self {
            Self::All => "noarch",
            Self::I386 => "x86",
            Self::Amd64 => "x86_64",
            Self::Arm5 | Self::Arm6 => "armhf",
            Self::Arm7 => "armv7",
            Self::Arm64 => "aarch64",
            Self::Mipsle => "mipsel",
            Self::Mips64le => "mips64el",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
            Self::Riscv64 => "riscv64",
        }
    }

    /// pacman `CARCH` spelling.
    pub fn archlinux_name(&self) -> &'static str {
        match self {
            Self::All => "any",
            Self::I386 => "i686",
            Self::Amd64 => "x86_64",
            Self::Arm5 => "arm",
            Self::Arm6 => "armv6h",
            Self::Arm7 => "armv7h",
            Self::Arm64 => "aarch64",
            Self::Mipsle => "mipsel",
            Self::Mips64le => "mips64el",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
            Self::Riscv64 => "riscv64",
        }
    }

    /// Spelling used by the given format.
    pub fn name_for(&self, format: Format) -> &'static str {
        match format {
            Format::Rpm => self.rpm_name(),
            Format::Deb => self.deb_name(),
            Format::Apk => self.apk_name(),
            Format::ArchLinux => self.archlinux_name(),
        }
    }
}

/// Translate a descriptor architecture into the format's vocabulary.
///
/// Unknown architectures are returned verbatim so that descriptors can name
/// exotic targets directly.
pub fn translate(arch: &str, format: Format) -> String {
    arch.parse::<Arch>()
        .map_or_else(|_| arch.to_string(), |a| a.name_for(format).to_string())
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "386" => Ok(Self::I386),
            "amd64" => Ok(Self::Amd64),
            "arm5" => Ok(Self::Arm5),
            "arm6" => Ok(Self::Arm6),
            "arm7" => Ok(Self::Arm7),
            "arm64" => Ok(Self::Arm64),
            "mipsle" => Ok(Self::Mipsle),
            "mips64le" => Ok(Self::Mips64le),
            "ppc64le" => Ok(Self::Ppc64le),
            "s390x" => Ok(Self::S390x),
            "riscv64" => Ok(Self::Riscv64),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_common_aliases() {
        assert_eq!(translate("amd64", Format::Rpm), "x86_64");
        assert_eq!(translate("386", Format::Rpm), "i386");
        assert_eq!(translate("arm64", Format::Rpm), "aarch64");
        assert_eq!(translate("386", Format::ArchLinux), "i686");
        assert_eq!(translate("arm64", Format::Deb), "arm64");
        assert_eq!(translate("386", Format::Apk), "x86");
    }

    #[test]
    fn unknown_arch_passes_through() {
        assert_eq!(translate("randomarch", Format::ArchLinux), "randomarch");
        assert_eq!(translate("x86_64", Format::Deb), "x86_64");
    }

    #[test]
    fn parse_roundtrips_display() {
        for name in ["all", "386", "amd64", "arm7", "arm64", "riscv64"] {
            let arch: Arch = name.parse().unwrap();
            assert_eq!(arch.to_string(), name);
        }
    }
}
