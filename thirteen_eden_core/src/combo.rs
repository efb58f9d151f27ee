use crate::card::Card;

/// 从 `n` 个下标中按字典序枚举所有 `K` 个一组的组合。
///
/// 只维护一个定长下标数组，不递归、不分配。
#[derive(Debug, Clone)]
pub struct Combinations<const K: usize> {
    n: usize,
    idx: [usize; K],
    done: bool,
}

impl<const K: usize> Combinations<K> {
    pub fn new(n: usize) -> Self {
        let mut idx = [0; K];
        for (i, slot) in idx.iter_mut().enumerate() {
            *slot = i;
        }
        Combinations { n, idx, done: K > n }
    }
}

impl<const K: usize> Iterator for Combinations<K> {
    type Item = [usize; K];

    fn next(&mut self) -> Option<[usize; K]> {
        if self.done {
            return None;
        }
        let current = self.idx;

        // 找到最右边还能后移的位置
        let mut i = K;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.idx[i] < self.n - K + i {
                self.idx[i] += 1;
                for j in i + 1..K {
                    self.idx[j] = self.idx[j - 1] + 1;
                }
                break;
            }
        }

        Some(current)
    }
}

/// 按下标把牌分成选中的 `K` 张和剩下的 `R` 张，两边都保持原来的顺序。
///
/// 要求 `cards.len() == K + R` 且不超过 16 张。
pub(crate) fn split_cards<const K: usize, const R: usize>(cards: &[Card], idx: &[usize; K]) -> ([Card; K], [Card; R]) {
    debug_assert_eq!(cards.len(), K + R);
    let filler = cards[0];
    let mut picked = [filler; K];
    let mut rest = [filler; R];

    let mut mask = 0u16;
    for (slot, &i) in idx.iter().enumerate() {
        picked[slot] = cards[i];
        mask |= 1 << i;
    }
    let mut r = 0;
    for (i, &card) in cards.iter().enumerate() {
        if mask & (1 << i) == 0 {
            rest[r] = card;
            r += 1;
        }
    }
    (picked, rest)
}

// --- 单元测试 ---
