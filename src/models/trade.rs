use serde::{Deserialize, Serialize};
use std::fmt;

/// 专业 (土建 / 电气 / 机电 / 建筑 / 综合)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Trade {
    Civil,
    Elec,
    Mech,
    Arch,
    #[default]
    General,
}

impl Trade {
    pub const ALL: [Trade; 5] = [
        Trade::Civil,
        Trade::Elec,
        Trade::Mech,
        Trade::Arch,
        Trade::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trade::Civil => "CIVIL",
            Trade::Elec => "ELEC",
            Trade::Mech => "MECH",
            Trade::Arch => "ARCH",
            Trade::General => "GENERAL",
        }
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
