//! 依洲別配額抽出參賽國家。
//!
//! 只有在要求的數量剛好等於配額總和時才套用配額，其他數量一律均勻隨機抽樣。
//! 所有洗牌都是 Fisher-Yates (`SliceRandom::shuffle`)。

use crate::domain::model::{Continent, Record};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

/// 可以依洲別分組的項目
pub trait Categorized {
    fn continent(&self) -> Option<Continent>;
}

impl Categorized for Record {
    fn continent(&self) -> Option<Continent> {
        self.continent
    }
}

impl<T: Categorized + ?Sized> Categorized for &T {
    fn continent(&self) -> Option<Continent> {
        (**self).continent()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaTable {
    quotas: BTreeMap<Continent, usize>,
}

impl Default for QuotaTable {
    /// 32 隊：歐、亞、非各 8，美洲 5，大洋洲 3
    fn default() -> Self {
        Self::new([
            (Continent::Europe, 8),
            (Continent::Asia, 8),
            (Continent::Africa, 8),
            (Continent::Americas, 5),
            (Continent::Oceania, 3),
        ])
    }
}

impl QuotaTable {
    pub fn new<I>(quotas: I) -> Self
    where
        I: IntoIterator<Item = (Continent, usize)>,
    {
        Self {
            quotas: quotas.into_iter().collect(),
        }
    }

    pub fn get(&self, continent: Continent) -> usize {
        self.quotas.get(&continent).copied().unwrap_or(0)
    }

    /// 觸發配額抽樣的數量
    pub fn full_sample_size(&self) -> usize {
        self.quotas.values().sum()
    }

    /// 依 Europe, Asia, Africa, Americas, Oceania 的順序列出，沒設定的洲為 0
    pub fn iter(&self) -> impl Iterator<Item = (Continent, usize)> + '_ {
        Continent::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    fn decrement(&mut self, continent: Continent) {
        if let Some(quota) = self.quotas.get_mut(&continent) {
            *quota = quota.saturating_sub(1);
        }
    }
}

impl Validate for QuotaTable {
    fn validate(&self) -> Result<()> {
        if self.full_sample_size() == 0 {
            return Err(EtlError::InvalidConfigValueError {
                field: "quotas".to_string(),
                value: "0".to_string(),
                reason: "At least one continent needs a non-zero quota".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuotaSampler {
    quotas: QuotaTable,
}

impl QuotaSampler {
    pub fn new(quotas: QuotaTable) -> Self {
        Self { quotas }
    }

    pub fn quotas(&self) -> &QuotaTable {
        &self.quotas
    }

    pub fn sample<'a, T, R>(&self, pool: &'a [T], count: usize, rng: &mut R) -> Vec<&'a T>
    where
        T: Categorized,
        R: Rng + ?Sized,
    {
        self.select(pool, count, None, rng)
            .into_iter()
            .map(|i| &pool[i])
            .collect()
    }

    /// 使用者已經先選好一隊：固定放在第一位，並佔用所屬洲的一個名額
    pub fn sample_with_pinned<'a, T, R>(
        &self,
        pool: &'a [T],
        count: usize,
        pinned: usize,
        rng: &mut R,
    ) -> Result<Vec<&'a T>>
    where
        T: Categorized,
        R: Rng + ?Sized,
    {
        if pinned >= pool.len() {
            return Err(EtlError::ValidationError {
                message: format!(
                    "Pinned index {} is outside a pool of {} records",
                    pinned,
                    pool.len()
                ),
            });
        }

        Ok(self
            .select(pool, count, Some(pinned), rng)
            .into_iter()
            .map(|i| &pool[i])
            .collect())
    }

    fn select<T, R>(&self, pool: &[T], count: usize, pinned: Option<usize>, rng: &mut R) -> Vec<usize>
    where
        T: Categorized,
        R: Rng + ?Sized,
    {
        if count == 0 {
            return Vec::new();
        }

        let mut selected: Vec<usize> = pinned.into_iter().collect();
        let candidates = || (0..pool.len()).filter(move |&i| Some(i) != pinned);

        if count != self.quotas.full_sample_size() {
            let mut shuffled: Vec<usize> = candidates().collect();
            shuffled.shuffle(rng);
            let wanted = count - selected.len();
            selected.extend(shuffled.into_iter().take(wanted));
            return selected;
        }

        let mut quotas = self.quotas.clone();
        if let Some(continent) = pinned.and_then(|i| pool[i].continent()) {
            quotas.decrement(continent);
        }

        for (continent, quota) in quotas.iter() {
            let mut region: Vec<usize> = candidates()
                .filter(|&i| pool[i].continent() == Some(continent))
                .collect();
            if region.len() < quota {
                tracing::debug!(
                    "{} has {} records for a quota of {}",
                    continent,
                    region.len(),
                    quota
                );
            }
            region.shuffle(rng);
            selected.extend(region.into_iter().take(quota));
        }

        if selected.len() < count {
            let taken: HashSet<usize> = selected.iter().copied().collect();
            let mut remaining: Vec<usize> = (0..pool.len()).filter(|i| !taken.contains(i)).collect();
            remaining.shuffle(rng);
            let missing = count - selected.len();
            tracing::debug!("Filling {} open slots from the remaining pool", missing);
            selected.extend(remaining.into_iter().take(missing));
        }

        let head = usize::from(pinned.is_some());
        selected[head..].shuffle(rng);

        // 指定隊伍沒扣到配額時總數會多一，洗牌後再截，被捨棄的是隨機一隊
        selected.truncate(count);
        selected
    }
}
