//! Service Registry - 이름/인터페이스 색인
//!
//! - name → entry
//! - interface → 최신 등록 이름
//! - interface → 등록된 모든 이름 (등록 순, 중복 없음)
//!
//! 동기화는 하지 않습니다. [`Container`](super::Container)가 락으로 감쌉니다.

use super::entry::RegistryEntry;
use super::interface::InterfaceId;
use std::collections::HashMap;
use uniapp_foundation::{Error, Result};

/// 서비스 레지스트리
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    entries: HashMap<String, RegistryEntry>,
    latest: HashMap<InterfaceId, String>,
    by_interface: HashMap<InterfaceId, Vec<String>>,
    next_sequence: u64,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 다음 등록 순번
    pub(crate) fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// 항목 추가 (같은 이름이 있으면 에러, 덮어쓰지 않음)
    pub fn insert(&mut self, entry: RegistryEntry) -> Result<()> {
        if self.entries.contains_key(&entry.name) {
            return Err(Error::AlreadyRegistered(entry.name.clone()));
        }

        let name = entry.name.clone();
        let interface = entry.interface;

        self.latest.insert(interface, name.clone());
        let names = self.by_interface.entry(interface).or_default();
        if !names.contains(&name) {
            names.push(name.clone());
        }
        self.entries.insert(name, entry);
        Ok(())
    }

    /// 항목 제거, 최신 인덱스는 남은 항목 중 가장 최근 등록으로 재계산
    pub fn remove(&mut self, name: &str) -> Option<RegistryEntry> {
        let entry = self.entries.remove(name)?;
        let interface = entry.interface;

        if let Some(names) = self.by_interface.get_mut(&interface) {
            names.retain(|n| n != name);
            if names.is_empty() {
                self.by_interface.remove(&interface);
            }
        }

        let replacement = self
            .by_interface
            .get(&interface)
            .and_then(|names| {
                names
                    .iter()
                    .filter_map(|n| self.entries.get(n))
                    .max_by_key(|e| e.sequence)
            })
            .map(|e| e.name.clone());

        match replacement {
            Some(latest) => {
                self.latest.insert(interface, latest);
            }
            None => {
                self.latest.remove(&interface);
            }
        }

        Some(entry)
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 인터페이스의 최신 등록 이름
    pub fn latest_name(&self, interface: &InterfaceId) -> Option<&str> {
        self.latest.get(interface).map(String::as_str)
    }

    /// 인터페이스로 등록된 모든 이름 (등록 순)
    pub fn names_for(&self, interface: &InterfaceId) -> &[String] {
        self.by_interface
            .get(interface)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}


