use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ChoreError, Result};

use super::{
    definition::{ChoreDefinition, ScheduleKind},
    instance::{ChoreInstance, ChoreState},
};

/// Outcome of an idempotent generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generated {
    Created(Uuid),
    Existing(Uuid),
}

impl Generated {
    pub fn instance_id(&self) -> Uuid {
        match self {
            Generated::Created(id) | Generated::Existing(id) => *id,
        }
    }
}

/// Owns chore definitions and instances, and the identity mappings around
/// them: external uids (e.g. to-do item ids) resolve to instance ids through
/// an explicit alias table, and a per-definition generation log keeps
/// repeated trigger firings from spawning duplicate instances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoreRegistry {
    #[serde(default)]
    pub definitions: Vec<ChoreDefinition>,
    #[serde(default)]
    pub instances: Vec<ChoreInstance>,
    #[serde(default)]
    pub aliases: HashMap<String, Uuid>,
    #[serde(default)]
    pub generated: HashMap<Uuid, BTreeMap<NaiveDate, Uuid>>,
}

impl ChoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate_chore_input(title: &str, points: i64) -> Result<()> {
        if title.trim().is_empty() {
            return Err(ChoreError::Validation("chore title must not be empty".into()));
        }
        if points < 0 {
            return Err(ChoreError::Validation(format!(
                "chore points must be >= 0, got {}",
                points
            )));
        }
        Ok(())
    }

    pub fn create_adhoc(
        &mut self,
        child_id: &str,
        title: &str,
        points: i64,
        category: Option<String>,
    ) -> Result<&ChoreInstance> {
        Self::validate_chore_input(title, points)?;
        let instance = ChoreInstance::new(child_id, title, points, category, None);
        self.instances.push(instance);
        Ok(self.instances.last().unwrap())
    }

    pub fn add_definition(&mut self, definition: ChoreDefinition) -> Result<Uuid> {
        Self::validate_chore_input(&definition.title, definition.points)?;
        let id = definition.id;
        self.definitions.push(definition);
        Ok(id)
    }

    pub fn definition(&self, id: Uuid) -> Option<&ChoreDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn set_definition_enabled(&mut self, id: Uuid, enabled: bool) -> Result<()> {
        let definition = self
            .definitions
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| ChoreError::NotFound(format!("chore definition `{}`", id)))?;
        definition.enabled = enabled;
        Ok(())
    }

    /// Spawns an instance of `definition_id` for `date`, or returns the
    /// instance already generated for that (definition, date) pair.
    pub fn generate_for_date(&mut self, definition_id: Uuid, date: NaiveDate) -> Result<Generated> {
        let definition = self
            .definition(definition_id)
            .ok_or_else(|| ChoreError::NotFound(format!("chore definition `{}`", definition_id)))?
            .clone();
        if !definition.enabled {
            return Err(ChoreError::InvalidState(format!(
                "chore definition `{}` is disabled",
                definition_id
            )));
        }
        // Repeated trigger firing: hand back the instance spawned earlier.
        if let Some(existing) = self
            .generated
            .get(&definition_id)
            .and_then(|dates| dates.get(&date))
        {
            return Ok(Generated::Existing(*existing));
        }
        let instance = ChoreInstance::new(
            &definition.child_id,
            &definition.title,
            definition.points,
            definition.category.clone(),
            Some(definition_id),
        );
        let id = instance.id;
        self.instances.push(instance);
        self.generated
            .entry(definition_id)
            .or_default()
            .insert(date, id);
        Ok(Generated::Created(id))
    }

    /// Definitions whose rule fires on `date`, honoring the enabled flag and
    /// an optional schedule-class filter.
    pub fn due_definitions(&self, date: NaiveDate, kind: Option<ScheduleKind>) -> Vec<Uuid> {
        self.definitions
            .iter()
            .filter(|d| d.enabled && d.rule.applies_on(date))
            .filter(|d| kind.is_none() || d.rule.schedule_kind() == kind)
            .map(|d| d.id)
            .collect()
    }

    pub fn instance(&self, id: Uuid) -> Option<&ChoreInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn instance_mut(&mut self, id: Uuid) -> Option<&mut ChoreInstance> {
        self.instances.iter_mut().find(|i| i.id == id)
    }

    /// Transitions `Created -> PendingApproval`, stamping the completion time.
    pub fn mark_completed(&mut self, instance_id: Uuid) -> Result<&ChoreInstance> {
        let instance = self
            .instance_mut(instance_id)
            .ok_or_else(|| ChoreError::NotFound(format!("chore instance `{}`", instance_id)))?;
        if instance.archived {
            return Err(ChoreError::InvalidState(format!(
                "chore instance `{}` is archived",
                instance_id
            )));
        }
        if instance.state != ChoreState::Created {
            return Err(ChoreError::InvalidState(format!(
                "chore instance `{}` is {:?}, expected Created",
                instance_id, instance.state
            )));
        }
        instance.state = ChoreState::PendingApproval;
        instance.completed_at = Some(Utc::now());
        Ok(instance)
    }

    pub fn set_state(&mut self, instance_id: Uuid, state: ChoreState) -> Result<()> {
        let instance = self
            .instance_mut(instance_id)
            .ok_or_else(|| ChoreError::NotFound(format!("chore instance `{}`", instance_id)))?;
        instance.state = state;
        if matches!(state, ChoreState::Approved | ChoreState::Rejected) {
            instance.resolved_at = Some(Utc::now());
        }
        Ok(())
    }

    pub fn alias(&mut self, external_uid: impl Into<String>, instance_id: Uuid) -> Result<()> {
        if self.instance(instance_id).is_none() {
            return Err(ChoreError::NotFound(format!(
                "chore instance `{}`",
                instance_id
            )));
        }
        self.aliases.insert(external_uid.into(), instance_id);
        Ok(())
    }

    pub fn resolve_alias(&self, external_uid: &str) -> Option<Uuid> {
        self.aliases.get(external_uid).copied()
    }

    /// Archives every instance belonging to `child_id` and drops the child's
    /// recurring definitions. Returns the archived instance ids.
    pub fn archive_child(&mut self, child_id: &str) -> Vec<Uuid> {
        let mut archived = Vec::new();
        for instance in &mut self.instances {
            if instance.child_id == child_id && !instance.archived {
                instance.archived = true;
                archived.push(instance.id);
            }
        }
        self.definitions.retain(|d| d.child_id != child_id);
        archived
    }

    pub fn active_instances_for(&self, child_id: &str) -> Vec<&ChoreInstance> {
        self.instances
            .iter()
            .filter(|i| i.child_id == child_id && i.is_active())
            .collect()
    }
}
