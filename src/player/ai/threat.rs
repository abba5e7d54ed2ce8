//! 脅威 (連のパターン) の分類と重みテーブル
//!
//! 一列に並んだマスを「自石 / 空き / ふさがり」の3値に直し、
//! 空き1マスまでを許す連を探して `Threat` に対応付ける。

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 連のパターン分類。宣言順が深刻度の高い順。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Threat {
    Five,
    StraightFour,
    BlockedFour,
    PokedFour,
    StraightThree,
    BlockedThree,
    PokedThree,
    StraightTwo,
    BlockedTwo,
    PokedTwo,
    None,
}

impl Threat {
    pub const COUNT: usize = 11;

    pub const ALL: [Threat; Threat::COUNT] = [
        Threat::Five,
        Threat::StraightFour,
        Threat::BlockedFour,
        Threat::PokedFour,
        Threat::StraightThree,
        Threat::BlockedThree,
        Threat::PokedThree,
        Threat::StraightTwo,
        Threat::BlockedTwo,
        Threat::PokedTwo,
        Threat::None,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// 次の一手で5連になる形
    pub fn is_four_level(self) -> bool {
        matches!(
            self,
            Threat::Five | Threat::StraightFour | Threat::BlockedFour | Threat::PokedFour
        )
    }

    /// 放置すると止められない四になる三
    pub fn is_live_three(self) -> bool {
        matches!(self, Threat::StraightThree | Threat::PokedThree)
    }

    /// 連の石数・空きの有無・両端のふさがりから分類する
    fn resolve(stones: usize, gapped: bool, left_blocked: bool, right_blocked: bool) -> Threat {
        let both = left_blocked && right_blocked;
        let one = left_blocked || right_blocked;
        if gapped {
            // 空きを埋めれば5連以上になる形は、5石以上でも四として扱う
            return match stones {
                s if s >= 4 => Threat::PokedFour,
                3 if !both => Threat::PokedThree,
                2 if !both => Threat::PokedTwo,
                _ => Threat::None,
            };
        }
        match stones {
            s if s >= 5 => Threat::Five,
            _ if both => Threat::None,
            4 if one => Threat::BlockedFour,
            4 => Threat::StraightFour,
            3 if one => Threat::BlockedThree,
            3 => Threat::StraightThree,
            2 if one => Threat::BlockedTwo,
            2 => Threat::StraightTwo,
            _ => Threat::None,
        }
    }
}

/// 列上のマスの状態 (手番側から見た値)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Own,
    /// 相手の石か盤端
    Blocked,
}

/// 評価対象マスを中心とした11マスの窓
pub const WINDOW: usize = 11;
pub const CENTER: usize = 5;

pub type Window = [Cell; WINDOW];

/// 窓を2bit/マスで符号化したキー
pub fn window_key(window: &Window) -> u32 {
    window.iter().fold(0u32, |key, cell| {
        (key << 2)
            | match cell {
                Cell::Empty => 0,
                Cell::Own => 1,
                Cell::Blocked => 2,
            }
    })
}

/// 列中の連を走査して、見つかった分類ごとに `f` を呼ぶ
///
/// `ends_blocked` は列の両端の外側を盤端 (ふさがり) とみなすかどうか。
/// 窓の両端は盤端とは限らないので false を渡す。
pub fn scan_runs<F: FnMut(Threat)>(cells: &[Cell], ends_blocked: bool, mut f: F) {
    let mut start = 0;
    while start < cells.len() {
        if cells[start] == Cell::Blocked {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < cells.len() && cells[end] != Cell::Blocked {
            end += 1;
        }
        scan_segment(cells, start, end, ends_blocked, &mut f);
        start = end;
    }
}

// [start, end) はふさがりを含まない区間
fn scan_segment<F: FnMut(Threat)>(
    cells: &[Cell],
    start: usize,
    end: usize,
    ends_blocked: bool,
    f: &mut F,
) {
    if end - start < 5 {
        // 5マス未満の空間ではどう置いても5連にならない (既存の5連も存在しえない)
        return;
    }

    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut i = start;
    while i < end {
        if cells[i] == Cell::Own {
            let s = i;
            while i < end && cells[i] == Cell::Own {
                i += 1;
            }
            runs.push((s, i));
        } else {
            i += 1;
        }
    }

    let left_edge_blocked = start > 0 || ends_blocked;
    let right_edge_blocked = end < cells.len() || ends_blocked;
    let blocked_at = |s: usize, e: usize| -> (bool, bool) {
        (
            s == start && left_edge_blocked,
            e == end && right_edge_blocked,
        )
    };

    let mut k = 0;
    while k < runs.len() {
        let (s1, e1) = runs[k];
        let len1 = e1 - s1;
        let (lb, rb) = blocked_at(s1, e1);
        let alone = Threat::resolve(len1, false, lb, rb);
        if let Some(&(s2, e2)) = runs.get(k + 1) {
            let len2 = e2 - s2;
            if s2 == e1 + 1 && len1 < 5 && len2 < 5 {
                let (lb, rb) = blocked_at(s1, e2);
                let merged = Threat::resolve(len1 + len2, true, lb, rb);
                let (lb, rb) = blocked_at(s2, e2);
                let second = Threat::resolve(len2, false, lb, rb);
                // 繋げた形がどちらの連単独よりも軽くない場合のみ1つの連とみなす。
                // そうでなければ後ろの連は次の周回で単独 (または更に次の連と) 分類する。
                if merged <= alone && merged <= second {
                    f(merged);
                    k += 2;
                    continue;
                }
            }
        }
        f(alone);
        k += 1;
    }
}

/// 列中で最も深刻な分類
pub fn classify(cells: &[Cell], ends_blocked: bool) -> Threat {
    let mut best = Threat::None;
    scan_runs(cells, ends_blocked, |t| {
        if t < best {
            best = t;
        }
    });
    best
}

// 窓 → 分類 のメモ。重みに依存しないのでプロセス全体で共有し、破棄しない。
static WINDOW_CACHE: Lazy<RwLock<HashMap<u32, Threat>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// 窓の分類 (メモ化あり)
pub fn classify_window(window: &Window) -> Threat {
    let key = window_key(window);
    if let Some(&t) = WINDOW_CACHE.read().get(&key) {
        return t;
    }
    let t = classify(window, false);
    WINDOW_CACHE.write().insert(key, t);
    t
}

/// Five の重みの上限。探索の窓 (±i32::MAX/2) に残り深さを足しても溢れない。
pub const MAX_FIVE: i32 = i32::MAX / 8;

/// 脅威ごとの重み。外部から調整可能。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Threat, i32>",
    into = "BTreeMap<Threat, i32>"
)]
pub struct ThreatWeights {
    values: [i32; Threat::COUNT],
}

impl Default for ThreatWeights {
    fn default() -> Self {
        ThreatWeights {
            values: [
                100_000_000, // Five
                1_000_000,   // StraightFour
                100_000,     // BlockedFour
                90_000,      // PokedFour
                50_000,      // StraightThree
                1_000,       // BlockedThree
                20_000,      // PokedThree
                500,         // StraightTwo
                50,          // BlockedTwo
                300,         // PokedTwo
                0,           // None
            ],
        }
    }
}

impl ThreatWeights {
    #[inline]
    pub fn weight(&self, threat: Threat) -> i32 {
        self.values[threat.index()]
    }

    /// 勝ちの閾値 (= Five の重み)
    #[inline]
    pub fn five(&self) -> i32 {
        self.values[Threat::Five.index()]
    }

    pub fn set(&mut self, threat: Threat, value: i32) -> Result<(), ConfigError> {
        let mut next = self.clone();
        next.values[threat.index()] = value;
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// 重みは非負で、Five が他のすべてより大きく `MAX_FIVE` 以下であること
    pub fn validate(&self) -> Result<(), ConfigError> {
        for t in Threat::ALL {
            let value = self.weight(t);
            if value < 0 {
                return Err(ConfigError::NegativeWeight {
                    threat: format!("{:?}", t),
                    value,
                });
            }
        }
        let max_other = Threat::ALL[1..]
            .iter()
            .map(|&t| self.weight(t))
            .max()
            .unwrap_or(0);
        if self.five() <= max_other {
            return Err(ConfigError::FiveNotDominant {
                five: self.five(),
                max_other,
            });
        }
        if self.five() > MAX_FIVE {
            return Err(ConfigError::FiveTooLarge {
                five: self.five(),
                max: MAX_FIVE,
            });
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<Threat, i32>> for ThreatWeights {
    type Error = ConfigError;

    /// 指定のない分類は既定値を使う
    fn try_from(map: BTreeMap<Threat, i32>) -> Result<Self, Self::Error> {
        let mut weights = ThreatWeights::default();
        for (threat, value) in map {
            weights.values[threat.index()] = value;
        }
        weights.validate()?;
        Ok(weights)
    }
}

impl From<ThreatWeights> for BTreeMap<Threat, i32> {
    fn from(weights: ThreatWeights) -> Self {
        Threat::ALL
            .iter()
            .map(|&t| (t, weights.weight(t)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Cell::{Blocked as X, Empty as E, Own as P};

    #[test]
    fn test_straight_and_blocked_fours() {
        assert_eq!(classify(&[E, P, P, P, P, E], false), Threat::StraightFour);
        assert_eq!(classify(&[X, P, P, P, P, E], false), Threat::BlockedFour);
        assert_eq!(classify(&[X, P, P, P, P, X], false), Threat::None);
    }

    #[test]
    fn test_poked_patterns() {
        assert_eq!(classify(&[E, P, P, P, E, P, E], false), Threat::PokedFour);
        assert_eq!(classify(&[E, P, E, P, P, E, E], false), Threat::PokedThree);
        assert_eq!(classify(&[E, P, E, P, E, E, E], false), Threat::PokedTwo);
        // 空き2マスは別の連
        assert_eq!(classify(&[E, P, E, E, P, E, E], false), Threat::None);
    }

    #[test]
    fn test_gapped_overline_is_poked_four() {
        assert_eq!(
            classify(&[E, P, P, P, E, P, P, E], false),
            Threat::PokedFour
        );
    }

    #[test]
    fn test_short_run_on_either_side_of_gap() {
        let cases: [(&[Cell], Threat); 12] = [
            (&[E, P, E, P, P, P, P, E], Threat::StraightFour),
            (&[E, P, P, P, P, E, P, E], Threat::StraightFour),
            (&[E, P, P, E, P, P, P, P, E], Threat::StraightFour),
            (&[E, P, P, P, P, E, P, P, E], Threat::StraightFour),
            (&[X, P, P, P, P, E, P, E], Threat::BlockedFour),
            (&[E, P, E, P, P, P, P, X], Threat::BlockedFour),
            (&[E, P, E, P, P, P, E, E], Threat::PokedFour),
            (&[E, E, P, P, P, E, P, E], Threat::PokedFour),
            (&[E, P, E, P, P, E, E], Threat::PokedThree),
            (&[E, E, P, P, E, P, E], Threat::PokedThree),
            (&[E, P, E, P, E, E, E], Threat::PokedTwo),
            (&[E, E, E, P, E, P, E], Threat::PokedTwo),
        ];
        for (cells, expected) in cases {
            assert_eq!(classify(cells, false), expected, "{:?}", cells);
        }
    }

    #[test]
    fn test_five_and_overline() {
        assert_eq!(classify(&[X, P, P, P, P, P, X], false), Threat::Five);
        assert_eq!(classify(&[P, P, P, P, P, P], true), Threat::Five);
    }

    #[test]
    fn test_line_ends_count_as_blocked() {
        // 盤端に接した四
        assert_eq!(classify(&[P, P, P, P, E, E], true), Threat::BlockedFour);
        assert_eq!(classify(&[P, P, P, P, E, E], false), Threat::StraightFour);
    }

    #[test]
    fn test_cramped_space_is_dead() {
        assert_eq!(classify(&[X, E, P, P, E, X], false), Threat::None);
        assert_eq!(classify(&[X, E, P, P, E, E, X], false), Threat::StraightTwo);
    }

    #[test]
    fn test_severity_order() {
        assert!(Threat::Five < Threat::StraightFour);
        assert!(Threat::PokedTwo < Threat::None);
        assert!(Threat::PokedFour.is_four_level());
        assert!(!Threat::BlockedThree.is_live_three());
    }

    #[test]
    fn test_window_cache_matches_direct() {
        let w: Window = [E, E, P, P, E, P, E, P, E, X, X];
        assert_eq!(classify_window(&w), classify(&w, false));
        assert_eq!(classify_window(&w), classify_window(&w));
    }

    #[test]
    fn test_weights_validation() {
        let weights = ThreatWeights::default();
        assert!(weights.validate().is_ok());

        let mut bad = weights.clone();
        assert!(matches!(
            bad.set(Threat::StraightFour, 200_000_000),
            Err(ConfigError::FiveNotDominant { .. })
        ));
        assert_eq!(bad, weights);
        assert!(matches!(
            bad.set(Threat::PokedTwo, -1),
            Err(ConfigError::NegativeWeight { .. })
        ));
    }

    #[test]
    fn test_five_weight_upper_bound() {
        let mut weights = ThreatWeights::default();
        assert!(weights.set(Threat::Five, MAX_FIVE).is_ok());
        assert_eq!(
            weights.set(Threat::Five, i32::MAX),
            Err(ConfigError::FiveTooLarge {
                five: i32::MAX,
                max: MAX_FIVE,
            })
        );
        assert_eq!(weights.five(), MAX_FIVE);
        assert!(serde_json::from_str::<ThreatWeights>(r#"{"five": 2147483647}"#).is_err());
    }

    #[test]
    fn test_weights_serde_partial_map() {
        let weights: ThreatWeights =
            serde_json::from_str(r#"{"straightThree": 7000, "five": 50000000}"#).unwrap();
        assert_eq!(weights.weight(Threat::StraightThree), 7000);
        assert_eq!(weights.five(), 50_000_000);
        assert_eq!(
            weights.weight(Threat::BlockedFour),
            ThreatWeights::default().weight(Threat::BlockedFour)
        );

        let json = serde_json::to_string(&weights).unwrap();
        let back: ThreatWeights = serde_json::from_str(&json).unwrap();
        assert_eq!(back, weights);
    }
}
