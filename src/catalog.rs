// 该文件是 Baicao （百草） 项目的一部分。
// src/catalog.rs - 类别目录与用途表
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Baicao contributors

use std::{
  collections::{BTreeMap, HashMap},
  path::Path,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// 用途表中缺少条目时返回的内容
pub const DEFAULT_USES_FALLBACK: &str = "Data not available";

#[derive(Error, Debug)]
pub enum CatalogError {
  #[error("类别目录为空")]
  Empty,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("类别索引无效: {0}")]
  InvalidIndex(String),
  #[error("类别索引缺失: {0}")]
  MissingIndex(usize),
  #[error("类别索引重复: {0}")]
  DuplicateIndex(usize),
}

/// 目录的 JSON 来源：列表、索引到名称、名称到索引（Keras `class_indices`）
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogSource {
  List(Vec<String>),
  ByIndex(BTreeMap<String, String>),
  ByName(BTreeMap<String, usize>),
}

/// 有序类别名称，第 i 项对应模型输出的第 i 个位置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "CatalogSource")]
pub struct ClassCatalog {
  names: Box<[String]>,
}

impl ClassCatalog {
  pub fn new<I, S>(names: I) -> Result<Self, CatalogError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let names = names.into_iter().map(Into::into).collect::<Vec<String>>();
    if names.is_empty() {
      return Err(CatalogError::Empty);
    }

    Ok(Self {
      names: names.into_boxed_slice(),
    })
  }

  pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
    let source: CatalogSource = serde_json::from_str(json)?;
    Self::try_from(source)
  }

  pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
    let path = path.as_ref();
    info!("加载类别目录: {}", path.display());
    let json = std::fs::read_to_string(path)?;
    let catalog = Self::from_json_str(&json)?;
    debug!("类别数量: {}", catalog.len());
    Ok(catalog)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.names.get(index).map(String::as_str)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.names.iter().any(|n| n == name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(String::as_str)
  }
}

/// 按索引排列名称，要求索引恰好覆盖 0..n
fn ordered_by_index(pairs: Vec<(usize, String)>) -> Result<Vec<String>, CatalogError> {
  let mut slots: Vec<Option<String>> = vec![None; pairs.len()];
  for (index, name) in pairs {
    let slot = slots
      .get_mut(index)
      .ok_or_else(|| CatalogError::InvalidIndex(format!("{} 超出类别数量", index)))?;
    if slot.is_some() {
      return Err(CatalogError::DuplicateIndex(index));
    }
    *slot = Some(name);
  }

  slots
    .into_iter()
    .enumerate()
    .map(|(index, name)| name.ok_or(CatalogError::MissingIndex(index)))
    .collect()
}

impl TryFrom<CatalogSource> for ClassCatalog {
  type Error = CatalogError;

  fn try_from(source: CatalogSource) -> Result<Self, Self::Error> {
    let names = match source {
      CatalogSource::List(names) => names,
      CatalogSource::ByIndex(map) => {
        let pairs = map
          .into_iter()
          .map(|(key, name)| {
            key
              .trim()
              .parse::<usize>()
              .map(|index| (index, name))
              .map_err(|_| CatalogError::InvalidIndex(key))
          })
          .collect::<Result<Vec<_>, _>>()?;
        ordered_by_index(pairs)?
      }
      CatalogSource::ByName(map) => {
        ordered_by_index(map.into_iter().map(|(name, index)| (index, name)).collect())?
      }
    };

    Self::new(names)
  }
}

/// 类别名称到用途说明的映射，不保证覆盖全部类别
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, Vec<String>>")]
pub struct UsesTable {
  entries: HashMap<String, Vec<String>>,
  fallback: Vec<String>,
}

impl Default for UsesTable {
  fn default() -> Self {
    Self {
      entries: HashMap::new(),
      fallback: vec![DEFAULT_USES_FALLBACK.to_string()],
    }
  }
}

impl From<HashMap<String, Vec<String>>> for UsesTable {
  fn from(entries: HashMap<String, Vec<String>>) -> Self {
    Self {
      entries,
      ..Self::default()
    }
  }
}

impl<K: Into<String>, V: IntoIterator<Item = S>, S: Into<String>> FromIterator<(K, V)>
  for UsesTable
{
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    let entries = iter
      .into_iter()
      .map(|(name, uses)| (name.into(), uses.into_iter().map(Into::into).collect()))
      .collect::<HashMap<_, _>>();
    Self::from(entries)
  }
}

impl UsesTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// 替换缺省内容；空列表会被忽略，缺省内容始终非空
  pub fn with_fallback<I, S>(mut self, fallback: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let fallback = fallback.into_iter().map(Into::into).collect::<Vec<String>>();
    if !fallback.is_empty() {
      self.fallback = fallback;
    }
    self
  }

  pub fn insert<I, S>(&mut self, name: impl Into<String>, uses: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .entries
      .insert(name.into(), uses.into_iter().map(Into::into).collect());
  }

  /// 查询类别用途，缺少条目或条目为空时返回缺省内容
  pub fn uses_for(&self, name: &str) -> &[String] {
    match self.entries.get(name) {
      Some(uses) if !uses.is_empty() => uses,
      _ => &self.fallback,
    }
  }

  pub fn fallback(&self) -> &[String] {
    &self.fallback
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }
}

/// 类别目录与用途表组成的数据文件
#[derive(Debug, Clone, Deserialize)]
pub struct Herbarium {
  pub classes: ClassCatalog,
  #[serde(default)]
  pub uses: UsesTable,
}

impl Herbarium {
  pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
    let herbarium: Herbarium = serde_json::from_str(json)?;
    for name in herbarium.uses.names() {
      if !herbarium.classes.contains(name) {
        warn!("用途表中的类别不在目录中: {}", name);
      }
    }
    Ok(herbarium)
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
    let path = path.as_ref();
    info!("加载植物数据文件: {}", path.display());
    let json = std::fs::read_to_string(path)?;
    let herbarium = Self::from_json_str(&json)?;
    info!(
      "类别数量: {}, 用途条目数量: {}",
      herbarium.classes.len(),
      herbarium.uses.len()
    );
    Ok(herbarium)
  }

  pub fn into_parts(self) -> (ClassCatalog, UsesTable) {
    (self.classes, self.uses)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn catalog_from_list() {
    let catalog = ClassCatalog::from_json_str(r#"["Aloevera", "Neem", "Tulsi"]"#).unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.get(1), Some("Neem"));
    assert_eq!(catalog.get(3), None);
  }

  #[test]
  fn catalog_from_index_map() {
    let catalog =
      ClassCatalog::from_json_str(r#"{"2": "Tulsi", "0": "Aloevera", "1": "Neem"}"#).unwrap();
    assert_eq!(
      catalog.iter().collect::<Vec<_>>(),
      vec!["Aloevera", "Neem", "Tulsi"]
    );
  }

  #[test]
  fn catalog_from_class_indices() {
    let catalog = ClassCatalog::from_json_str(r#"{"Neem": 1, "Tulsi": 2, "Aloevera": 0}"#).unwrap();
    assert_eq!(
      catalog.iter().collect::<Vec<_>>(),
      vec!["Aloevera", "Neem", "Tulsi"]
    );
  }

  #[test]
  fn catalog_rejects_gaps_and_empty() {
    assert!(matches!(
      ClassCatalog::from_json_str(r#"{"Neem": 0, "Tulsi": 2}"#),
      Err(CatalogError::InvalidIndex(_))
    ));
    assert!(matches!(
      ClassCatalog::from_json_str(r#"{"Neem": 0, "Tulsi": 0}"#),
      Err(CatalogError::DuplicateIndex(0))
    ));
    assert!(matches!(
      ClassCatalog::from_json_str(r#"{"zero": "Neem"}"#),
      Err(CatalogError::InvalidIndex(_))
    ));
    assert!(matches!(
      ClassCatalog::from_json_str("[]"),
      Err(CatalogError::Empty)
    ));
    assert!(matches!(
      ClassCatalog::from_json_str("42"),
      Err(CatalogError::JsonError(_))
    ));
  }

  #[test]
  fn uses_fall_back_when_missing() {
    let mut uses = UsesTable::new();
    uses.insert("Neem", ["Skin care", "Dental care"]);
    uses.insert("Mint", Vec::<String>::new());

    assert_eq!(uses.uses_for("Neem"), ["Skin care", "Dental care"]);
    assert_eq!(uses.uses_for("Tulsi"), [DEFAULT_USES_FALLBACK]);
    assert_eq!(uses.uses_for("Mint"), [DEFAULT_USES_FALLBACK]);
  }

  #[test]
  fn custom_fallback_is_never_empty() {
    let uses = UsesTable::new().with_fallback(Vec::<String>::new());
    assert_eq!(uses.uses_for("Tulsi"), [DEFAULT_USES_FALLBACK]);

    let uses = UsesTable::new().with_fallback(["No medicinal data recorded"]);
    assert_eq!(uses.uses_for("Tulsi"), ["No medicinal data recorded"]);
  }

  #[test]
  fn herbarium_without_uses() {
    let herbarium = Herbarium::from_json_str(r#"{"classes": ["X", "Y"]}"#).unwrap();
    let (catalog, uses) = herbarium.into_parts();
    assert_eq!(catalog.len(), 2);
    assert!(uses.is_empty());
    assert_eq!(uses.uses_for("Y"), [DEFAULT_USES_FALLBACK]);
  }

  #[test]
  fn herbarium_with_uses() {
    let herbarium = Herbarium::from_json_str(
      r#"{
        "classes": {"Aloevera": 0, "Neem": 1},
        "uses": {"Neem": ["Skin care"], "Ginger": ["Digestion"]}
      }"#,
    )
    .unwrap();
    assert_eq!(herbarium.classes.get(0), Some("Aloevera"));
    assert_eq!(herbarium.uses.uses_for("Neem"), ["Skin care"]);
    assert_eq!(herbarium.uses.uses_for("Aloevera"), [DEFAULT_USES_FALLBACK]);
  }
}
