//! Exercise catalog - rows from the `exercicios` table and the queries over it

use serde::{Deserialize, Serialize};

/// Maximum rows the backend returns for one catalog query
pub const CATALOG_PAGE_LIMIT: usize = 100;

/// Who authored a catalog exercise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExerciseSource {
    /// Global catalog, visible to every trainer
    #[serde(rename = "padrao")]
    Standard,
    /// Authored by a single trainer
    #[serde(rename = "personalizado")]
    Custom,
}

impl ExerciseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseSource::Standard => "padrao",
            ExerciseSource::Custom => "personalizado",
        }
    }
}

/// Catalog row as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogExercise {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "grupo_muscular")]
    pub muscle_group: String,
    #[serde(rename = "equipamento")]
    pub equipment: String,
    #[serde(rename = "tipo")]
    pub source: ExerciseSource,
}

/// Snapshot of a catalog row captured when it is added to a workout.
///
/// Later catalog edits never reach an entry that already holds a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRef {
    pub exercise_id: String,
    pub name: String,
    pub muscle_group: String,
    pub equipment: String,
}

impl From<&CatalogExercise> for CatalogRef {
    fn from(row: &CatalogExercise) -> Self {
        Self {
            exercise_id: row.id.clone(),
            name: row.name.clone(),
            muscle_group: row.muscle_group.clone(),
            equipment: row.equipment.clone(),
        }
    }
}

/// Server-side catalog filter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogQuery {
    /// Restrict to these groups (`in.(...)`), empty = no restriction
    pub muscle_groups: Vec<String>,
    /// Restrict to one group (`eq.`), takes precedence over `muscle_groups`
    pub muscle_group: Option<String>,
    pub source: Option<ExerciseSource>,
    /// Owner of custom exercises
    pub owner_id: Option<String>,
}

impl CatalogQuery {
    /// PostgREST query parameters for `GET /rest/v1/exercicios`
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("select".to_string(), "id,nome,grupo_muscular,equipamento,tipo".to_string()),
            ("is_ativo".to_string(), "eq.true".to_string()),
        ];

        if let Some(group) = &self.muscle_group {
            params.push(("grupo_muscular".to_string(), format!("eq.{}", group)));
        } else if !self.muscle_groups.is_empty() {
            let quoted: Vec<String> = self.muscle_groups
                .iter()
                .map(|g| format!("\"{}\"", g.replace('"', "\\\"")))
                .collect();
            params.push(("grupo_muscular".to_string(), format!("in.({})", quoted.join(","))));
        }

        if let Some(source) = self.source {
            params.push(("tipo".to_string(), format!("eq.{}", source.as_str())));
        }
        if let Some(owner) = &self.owner_id {
            params.push(("pt_id".to_string(), format!("eq.{}", owner)));
        }

        params.push(("order".to_string(), "tipo.asc,nome.asc".to_string()));
        params.push(("limit".to_string(), CATALOG_PAGE_LIMIT.to_string()));
        params
    }
}

/// Case-insensitive substring match on the exercise name
pub fn matches_search(row: &CatalogExercise, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    needle.is_empty() || row.name.to_lowercase().contains(&needle)
}

/// Find a row by catalog id
pub fn find_by_id<'a>(rows: &'a [CatalogExercise], id: &str) -> Option<&'a CatalogExercise> {
    rows.iter().find(|r| r.id == id)
}

#[cfg(test)]
pub(crate) fn row(id: &str, name: &str, group: &str) -> CatalogExercise {
    CatalogExercise {
        id: id.to_string(),
        name: name.to_string(),
        muscle_group: group.to_string(),
        equipment: "Barra".to_string(),
        source: ExerciseSource::Standard,
    }
}
