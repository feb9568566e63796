//! The sexagenary cycle: heavenly stems, earthly branches, the five elements,
//! ten-gods classification, and the Na Yin table.
//!
//! Everything here is a fieldless enum over a small integer position plus
//! constant lookup tables; all derivations are pure index arithmetic.

use serde::{Deserialize, Serialize};

/// Yin/Yang polarity of a stem or branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Yang,
    Yin,
}

/// One of the five elements, ordered along the productive cycle
/// (Wood → Fire → Earth → Metal → Water → Wood).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub fn from_index(i: u8) -> Option<Self> {
        use Element::*;
        [Wood, Fire, Earth, Metal, Water].get(i as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// The element this one produces in the generative cycle.
    pub fn produces(self) -> Element {
        Element::from_index((self.index() + 1) % 5).unwrap()
    }

    /// The element this one destroys in the controlling cycle.
    pub fn destroys(self) -> Element {
        Element::from_index((self.index() + 2) % 5).unwrap()
    }

    pub fn zh(self) -> &'static str {
        ["木", "火", "土", "金", "水"][self.index() as usize]
    }
}

/// The ten heavenly stems, positions 0 (甲) through 9 (癸).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stem {
    Jia,
    Yi,
    Bing,
    Ding,
    Wu,
    Ji,
    Geng,
    Xin,
    Ren,
    Gui,
}

impl Stem {
    pub fn from_index(i: u8) -> Option<Self> {
        use Stem::*;
        [Jia, Yi, Bing, Ding, Wu, Ji, Geng, Xin, Ren, Gui]
            .get(i as usize)
            .copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Two consecutive stems share an element.
    pub fn element(self) -> Element {
        Element::from_index(self.index() / 2).unwrap()
    }

    /// Even positions are Yang, odd are Yin.
    pub fn polarity(self) -> Polarity {
        if self.index() % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }

    pub fn zh(self) -> &'static str {
        ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"][self.index() as usize]
    }
}

/// The twelve earthly branches, positions 0 (子) through 11 (亥).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    Zi,
    Chou,
    Yin,
    Mao,
    Chen,
    Si,
    Wu,
    Wei,
    Shen,
    You,
    Xu,
    Hai,
}

impl Branch {
    pub fn from_index(i: u8) -> Option<Self> {
        use Branch::*;
        [Zi, Chou, Yin, Mao, Chen, Si, Wu, Wei, Shen, You, Xu, Hai]
            .get(i as usize)
            .copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn element(self) -> Element {
        const TABLE: [u8; 12] = [4, 2, 0, 0, 2, 1, 1, 2, 3, 3, 2, 4];
        Element::from_index(TABLE[self.index() as usize]).unwrap()
    }

    /// The branch's principal hidden stem (本气). Ten-gods classification of
    /// a branch goes through this stem, so 子 counts as 癸 (Yin Water)
    /// despite its even cycle position.
    pub fn principal_stem(self) -> Stem {
        const TABLE: [u8; 12] = [9, 5, 0, 1, 4, 2, 3, 5, 6, 7, 4, 8];
        Stem::from_index(TABLE[self.index() as usize]).unwrap()
    }

    pub fn polarity(self) -> Polarity {
        if self.index() % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }

    pub fn zh(self) -> &'static str {
        ["子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥"]
            [self.index() as usize]
    }

    pub fn zodiac(self) -> &'static str {
        ["鼠", "牛", "虎", "兔", "龙", "蛇", "马", "羊", "猴", "鸡", "狗", "猪"]
            [self.index() as usize]
    }
}

/// A stem-branch pair, identified by its position 0..=59 in the 60-cycle.
/// Only parity-matched pairs exist; construction from an arbitrary
/// (stem, branch) pair validates that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanZhi {
    index: u8,
}

impl GanZhi {
    pub fn from_index(index: u8) -> Option<Self> {
        (index < 60).then_some(Self { index })
    }

    /// `None` when the parity of stem and branch positions differs; such
    /// pairs never occur in the lockstep cycle.
    pub fn from_pair(stem: Stem, branch: Branch) -> Option<Self> {
        let s = stem.index() as i32;
        let b = branch.index() as i32;
        if s % 2 != b % 2 {
            return None;
        }
        // CRT over (10, 12): the unique 0..60 position congruent to s mod 10
        // and b mod 12.
        let index = (0..6).map(|k| s + 10 * k).find(|&x| x % 12 == b)?;
        Self::from_index(index as u8)
    }

    pub fn index(self) -> u8 {
        self.index
    }

    pub fn stem(self) -> Stem {
        Stem::from_index(self.index % 10).unwrap()
    }

    pub fn branch(self) -> Branch {
        Branch::from_index(self.index % 12).unwrap()
    }

    /// Steps `n` positions through the cycle (negative steps go backward).
    pub fn step(self, n: i32) -> GanZhi {
        let index = (self.index as i32 + n).rem_euclid(60) as u8;
        GanZhi { index }
    }

    pub fn name(self) -> String {
        format!("{}{}", self.stem().zh(), self.branch().zh())
    }

    /// The "hidden sound" label; each covers two consecutive cycle positions.
    pub fn na_yin(self) -> &'static str {
        NA_YIN[self.index as usize / 2]
    }
}

/// The 30 Na Yin labels, one per pair of consecutive cycle positions.
const NA_YIN: [&str; 30] = [
    "海中金", "炉中火", "大林木", "路旁土", "剑锋金", "山头火", "涧下水", "城头土", "白蜡金",
    "杨柳木", "泉中水", "屋上土", "霹雳火", "松柏木", "长流水", "沙中金", "山下火", "平地木",
    "壁上土", "金箔金", "覆灯火", "天河水", "大驿土", "钗钏金", "桑柘木", "大溪水", "沙中土",
    "天上火", "石榴木", "大海水",
];

/// The ten relational categories against the day master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenGod {
    /// 比肩: same element, same polarity.
    Friend,
    /// 劫财: same element, opposite polarity.
    RobWealth,
    /// 食神: produced by the day master, same polarity.
    EatingGod,
    /// 伤官: produced by the day master, opposite polarity.
    HurtingOfficer,
    /// 偏财: destroyed by the day master, same polarity.
    IndirectWealth,
    /// 正财: destroyed by the day master, opposite polarity.
    DirectWealth,
    /// 七杀: destroys the day master, same polarity.
    SevenKillings,
    /// 正官: destroys the day master, opposite polarity.
    DirectOfficer,
    /// 偏印: produces the day master, same polarity.
    IndirectResource,
    /// 正印: produces the day master, opposite polarity.
    DirectResource,
}

impl TenGod {
    /// Classifies `(element, polarity)` against the day stem using the
    /// productive-cycle distance. Distance 1 means the day master produces
    /// the other element, 4 means the other produces the day master, and
    /// so on around the cycle.
    pub fn classify(day_master: Stem, element: Element, polarity: Polarity) -> TenGod {
        use TenGod::*;
        let distance = (element.index() + 5 - day_master.element().index()) % 5;
        let same = polarity == day_master.polarity();
        match (distance, same) {
            (0, true) => Friend,
            (0, false) => RobWealth,
            (1, true) => EatingGod,
            (1, false) => HurtingOfficer,
            (2, true) => IndirectWealth,
            (2, false) => DirectWealth,
            (3, true) => SevenKillings,
            (3, false) => DirectOfficer,
            (4, true) => IndirectResource,
            (4, false) => DirectResource,
            _ => unreachable!(),
        }
    }

    /// Classification of another stem against the day master.
    pub fn of_stem(day_master: Stem, other: Stem) -> TenGod {
        Self::classify(day_master, other.element(), other.polarity())
    }

    /// Classification of a branch: goes through its principal hidden stem.
    pub fn of_branch(day_master: Stem, branch: Branch) -> TenGod {
        Self::of_stem(day_master, branch.principal_stem())
    }

    pub fn zh(self) -> &'static str {
        use TenGod::*;
        match self {
            Friend => "比肩",
            RobWealth => "劫财",
            EatingGod => "食神",
            HurtingOfficer => "伤官",
            IndirectWealth => "偏财",
            DirectWealth => "正财",
            SevenKillings => "七杀",
            DirectOfficer => "正官",
            IndirectResource => "偏印",
            DirectResource => "正印",
        }
    }
}

/// Five-tigers rule: the stem of the first month sector (寅) for a given
/// year stem, offset by the sector number (0 = the Lichun sector).
pub fn five_tigers_stem(year_stem: Stem, sector: usize) -> Stem {
    let first = (year_stem.index() % 5) * 2 + 2;
    Stem::from_index((first as usize + sector) as u8 % 10).unwrap()
}

/// Five-rats rule: the stem of an hour branch for a given day stem.
pub fn five_rats_stem(day_stem: Stem, hour_branch: Branch) -> Stem {
    let first = (day_stem.index() % 5) * 2;
    Stem::from_index((first + hour_branch.index()) % 10).unwrap()
}
