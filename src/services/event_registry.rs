//! Event type registry and facade cache.
//!
//! Decides whether a host object is an event (an [`EventType`] exists for its
//! entity type and bundle) and hands out cached [`EventFacade`]s. The cache is
//! process-local and only invalidated explicitly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EventEntity, EventRef, EventType, RuleTemplate};
use crate::domain::ports::{EventTypeRepository, RuleTemplateRepository};
use crate::services::event_facade::EventFacade;
use crate::services::plugin_registry::PluginRegistry;
use crate::services::rule_service::RuleService;

pub struct EventRegistry {
    event_types: Arc<dyn EventTypeRepository>,
    templates: Arc<dyn RuleTemplateRepository>,
    rules: Arc<RuleService>,
    plugins: Arc<PluginRegistry>,
    facades: RwLock<HashMap<EventRef, Arc<EventFacade>>>,
}

impl EventRegistry {
    pub fn new(
        event_types: Arc<dyn EventTypeRepository>,
        templates: Arc<dyn RuleTemplateRepository>,
        rules: Arc<RuleService>,
        plugins: Arc<PluginRegistry>,
    ) -> Self {
        Self {
            event_types,
            templates,
            rules,
            plugins,
            facades: RwLock::new(HashMap::new()),
        }
    }

    /// Whether an event type is configured for the object's entity type and bundle.
    pub async fn is_event(&self, entity: &EventEntity) -> DomainResult<bool> {
        Ok(self
            .event_types
            .get(&entity.entity_type, &entity.bundle)
            .await?
            .is_some())
    }

    pub async fn get_event_type(
        &self,
        entity_type: &str,
        bundle: &str,
    ) -> DomainResult<Option<EventType>> {
        self.event_types.get(entity_type, bundle).await
    }

    pub async fn list_event_types(&self) -> DomainResult<Vec<EventType>> {
        self.event_types.list().await
    }

    /// The facade for an event, built on first use and cached afterwards.
    pub async fn get_facade(&self, entity: &EventEntity) -> DomainResult<Arc<EventFacade>> {
        let key = entity.reference();
        if let Some(facade) = self.facades.read().await.get(&key) {
            return Ok(Arc::clone(facade));
        }

        let event_type = self
            .event_types
            .get(&entity.entity_type, &entity.bundle)
            .await?
            .ok_or_else(|| DomainError::NotAnEvent {
                entity_type: entity.entity_type.clone(),
                bundle: entity.bundle.clone(),
            })?;

        let facade = Arc::new(EventFacade::new(
            entity.clone(),
            event_type,
            Arc::clone(&self.rules),
            Arc::clone(&self.templates),
            Arc::clone(&self.plugins),
        ));

        let mut facades = self.facades.write().await;
        Ok(Arc::clone(facades.entry(key).or_insert(facade)))
    }

    /// Drop the cached facade of one event.
    pub async fn invalidate(&self, event: &EventRef) {
        self.facades.write().await.remove(event);
    }

    pub async fn invalidate_all(&self) {
        self.facades.write().await.clear();
    }

    pub async fn cached_facades(&self) -> usize {
        self.facades.read().await.len()
    }

    /// Create or replace an event type.
    pub async fn save_event_type(&self, mut event_type: EventType) -> DomainResult<EventType> {
        event_type.updated_at = Utc::now();
        self.event_types.save(&event_type).await?;
        self.invalidate_all().await;
        tracing::info!(event_type = %event_type.id(), "Saved event type");
        Ok(event_type)
    }

    /// Delete an event type together with its rule templates.
    pub async fn delete_event_type(&self, entity_type: &str, bundle: &str) -> DomainResult<()> {
        let removed = self.templates.delete_for_event_type(entity_type, bundle).await?;
        self.event_types.delete(entity_type, bundle).await?;
        self.invalidate_all().await;
        tracing::info!(entity_type, bundle, templates = removed, "Deleted event type");
        Ok(())
    }

    /// Save a rule template. Its event type must exist.
    pub async fn save_template(&self, mut template: RuleTemplate) -> DomainResult<RuleTemplate> {
        if self
            .event_types
            .get(&template.entity_type, &template.bundle)
            .await?
            .is_none()
        {
            return Err(DomainError::NotAnEvent {
                entity_type: template.entity_type.clone(),
                bundle: template.bundle.clone(),
            });
        }
        template.updated_at = Utc::now();
        self.templates.save(&template).await?;
        Ok(template)
    }

    pub async fn delete_template(&self, id: &str) -> DomainResult<()> {
        self.templates.delete(id).await
    }

    pub async fn list_templates(&self) -> DomainResult<Vec<RuleTemplate>> {
        self.templates.list().await
    }

    /// Remove everything stored for a deleted event: its rules, their
    /// components and schedules, and the cached facade.
    pub async fn delete_event_data(&self, event: &EventRef) -> DomainResult<u64> {
        let deleted = self.rules.delete_rules_for_event(event).await?;
        self.invalidate(event).await;
        tracing::info!(event = %event, rules = deleted, "Deleted event rules");
        Ok(deleted)
    }
}
