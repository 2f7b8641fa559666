use tabled::{settings::Style, Table, Tabled};

use crate::entity::{Entity, EntityKind};

#[derive(Tabled)]
pub struct EntityRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Updated")]
    pub updated_at: String,
}

#[derive(Tabled)]
pub struct CountRow {
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Count")]
    pub count: usize,
}

pub struct TableBuilder {
    rows: Vec<EntityRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_entity(&mut self, entity: &Entity) {
        self.rows.push(EntityRow {
            key: entity.key().to_string(),
            label: entity.label().unwrap_or("-").to_string(),
            updated_at: entity.base().updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn entity_table<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> String {
    let mut builder = TableBuilder::new();
    for entity in entities {
        builder.add_entity(entity);
    }
    builder.build()
}

pub fn count_table(counts: &[(EntityKind, usize)]) -> String {
    let rows: Vec<CountRow> = counts
        .iter()
        .map(|(kind, count)| CountRow {
            kind: kind.to_string(),
            count: *count,
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::State;

    #[test]
    fn test_entity_table_lists_keys() {
        let state: Entity = State::new("Lagos").into();
        let table = entity_table([&state]);
        assert!(table.contains(&state.key().to_string()));
        assert!(table.contains("Lagos"));
    }

    #[test]
    fn test_empty_entity_table() {
        assert!(entity_table(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_count_table() {
        let table = count_table(&[(EntityKind::State, 4)]);
        assert!(table.contains("State"));
        assert!(table.contains('4'));
    }
}
