//! JustificationEngine: entities, reasons and local confidence over the
//! storage traits.

use std::sync::Arc;

use tracing::{debug, instrument};

use conceptdb_core::config::ConfidenceConfig;
use conceptdb_core::confidence::combine;
use conceptdb_core::constants::{OPPOSE_VOTE, SUPPORT_VOTE};
use conceptdb_core::errors::{ConceptDbError, ConceptDbResult};
use conceptdb_core::traits::{IConfidenceStorage, IEntityLookup, IEntityStorage, IReasonStorage};
use conceptdb_core::{Confidence, EntityKind, EntityRef, Polarity, ReasonId, ReasonRecord};

use crate::entities::{Assertion, Dataset, Expression, ExternalReason, Sentence};
use crate::factor::{Conjunction, Factor};
use crate::justified::{Entity, Justified};
use crate::locks::EntityLocks;

/// Keeps entities, their justifications and the reason store in step.
///
/// Every read-modify-write of an entity runs under that entity's lock.
pub struct JustificationEngine {
    reasons: Arc<dyn IReasonStorage>,
    confidences: Arc<dyn IConfidenceStorage>,
    entities: Arc<dyn IEntityStorage>,
    config: ConfidenceConfig,
    locks: EntityLocks,
}

impl JustificationEngine {
    pub fn new(
        reasons: Arc<dyn IReasonStorage>,
        confidences: Arc<dyn IConfidenceStorage>,
        entities: Arc<dyn IEntityStorage>,
    ) -> Self {
        Self {
            reasons,
            confidences,
            entities,
            config: ConfidenceConfig::default(),
            locks: EntityLocks::new(),
        }
    }

    /// One backend serving all three roles.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: IReasonStorage + IConfidenceStorage + IEntityStorage + 'static,
    {
        Self::new(store.clone(), store.clone(), store)
    }

    pub fn with_config(mut self, config: ConfidenceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ConfidenceConfig {
        &self.config
    }

    pub fn locks(&self) -> &EntityLocks {
        &self.locks
    }

    // --- Entities ---

    /// Write the entity body and its current confidence.
    pub fn save<E: Entity>(&self, entity: &E) -> ConceptDbResult<()> {
        let id = entity.reason_id();
        let body = serde_json::to_value(entity)?;
        self.entities.save_entity(&id, &body)?;
        self.confidences
            .set(&id, Confidence::new(entity.confidence()))?;
        Ok(())
    }

    pub fn load<E: Entity>(&self, id: &ReasonId) -> ConceptDbResult<Option<E>> {
        if id.kind() != E::KIND {
            return Err(ConceptDbError::InvalidArgument(format!(
                "{id} is not a {}",
                E::KIND.as_str()
            )));
        }
        match self.entities.load_entity(id)? {
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
            None => Ok(None),
        }
    }

    /// Load, mutate and save one entity under its lock.
    pub fn update<E: Entity, R>(
        &self,
        id: &ReasonId,
        f: impl FnOnce(&mut E) -> ConceptDbResult<R>,
    ) -> ConceptDbResult<R> {
        self.locks.with_lock(&id.to_string(), || {
            self.update_unlocked(id, f)?
                .ok_or_else(|| ConceptDbError::not_found(id))
        })
    }

    fn update_unlocked<E: Entity, R>(
        &self,
        id: &ReasonId,
        f: impl FnOnce(&mut E) -> ConceptDbResult<R>,
    ) -> ConceptDbResult<Option<R>> {
        let Some(mut entity) = self.load::<E>(id)? else {
            return Ok(None);
        };
        let result = f(&mut entity)?;
        self.save(&entity)?;
        Ok(Some(result))
    }

    /// Apply `f` to whatever entity `id` names. `Ok(None)` when `id` names
    /// no stored entity. The caller holds the lock.
    fn update_justified<R>(
        &self,
        id: &ReasonId,
        f: impl FnOnce(&mut dyn Justified) -> ConceptDbResult<R>,
    ) -> ConceptDbResult<Option<R>> {
        match id.kind() {
            EntityKind::Assertion => self.update_unlocked::<Assertion, R>(id, |e| f(e)),
            EntityKind::Expression => self.update_unlocked::<Expression, R>(id, |e| f(e)),
            EntityKind::Sentence => self.update_unlocked::<Sentence, R>(id, |e| f(e)),
            EntityKind::ExternalReason => {
                self.update_unlocked::<ExternalReason, R>(id, |e| f(e))
            }
            EntityKind::ReasonConjunction | EntityKind::Named => Ok(None),
        }
    }

    /// Return the stored entity with `candidate`'s id, or store `candidate`.
    fn get_or_create<E: Entity>(&self, candidate: E) -> ConceptDbResult<E> {
        let id = candidate.reason_id();
        self.locks.with_lock(&id.to_string(), || {
            if let Some(existing) = self.load::<E>(&id)? {
                return Ok(existing);
            }
            self.save(&candidate)?;
            debug!(id = %id, kind = E::KIND.as_str(), "created entity");
            Ok(candidate)
        })
    }

    pub fn make_assertion(
        &self,
        dataset: &str,
        relation: &str,
        arguments: Vec<String>,
        polarity: i8,
        context: Option<&str>,
    ) -> ConceptDbResult<Assertion> {
        self.get_or_create(Assertion::make(dataset, relation, arguments, polarity, context)?)
    }

    pub fn make_expression(
        &self,
        assertion: &Assertion,
        frame: &str,
        arguments: Vec<String>,
        language: &str,
    ) -> ConceptDbResult<Expression> {
        let expression = Expression::make(assertion, frame, arguments, language);
        expression.check_against(assertion)?;
        self.get_or_create(expression)
    }

    pub fn make_sentence(&self, dataset: &str, text: &str) -> ConceptDbResult<Sentence> {
        self.get_or_create(Sentence::make(dataset, text))
    }

    /// Attach an assertion to the sentence it was read from.
    pub fn connect_to_sentence(
        &self,
        assertion: &Assertion,
        dataset: &str,
        text: &str,
    ) -> ConceptDbResult<Sentence> {
        let sentence = self.make_sentence(dataset, text)?;
        self.update::<Sentence, _>(&sentence.reason_id(), |s| {
            s.add_assertion(&assertion.id);
            Ok(s.clone())
        })
    }

    /// The dataset's root reason, stored with full confidence.
    pub fn root_reason(&self, dataset: &Dataset) -> ConceptDbResult<ExternalReason> {
        self.get_or_create(ExternalReason::root(dataset))
    }

    /// Store a reason derived from `parent` and record the supporting edge.
    pub fn derive_reason(
        &self,
        parent: &ExternalReason,
        suffix: &str,
        reliability: f64,
    ) -> ConceptDbResult<ExternalReason> {
        let child = parent.derived(suffix, reliability)?;
        let child_id = child.reason_id();
        self.locks.with_lock(&child_id.to_string(), || {
            self.save(&child)?;
            self.reasons
                .make(&child_id, &[parent.reason_id()], SUPPORT_VOTE, 1.0)?;
            Ok(())
        })?;
        Ok(child)
    }

    /// Stored expressions of an assertion, in id order.
    pub fn expressions_of(&self, assertion: &Assertion) -> ConceptDbResult<Vec<Expression>> {
        let mut out = Vec::new();
        for id in self.entities.entity_ids(EntityKind::Expression)? {
            if matches!(&id, ReasonId::Expression { assertion: a, .. } if *a == assertion.id) {
                if let Some(e) = self.load::<Expression>(&id)? {
                    out.push(e);
                }
            }
        }
        Ok(out)
    }

    /// Store every generalization of `assertion` (and of its expressions),
    /// each supported by `reason` together with its source.
    #[instrument(skip_all, fields(assertion = %assertion.id, reason = %reason))]
    pub fn make_generalizations(
        &self,
        assertion: &Assertion,
        reason: &ReasonId,
    ) -> ConceptDbResult<Vec<Assertion>> {
        let expressions = self.expressions_of(assertion)?;
        let mut made = Vec::new();
        for pattern in assertion.generalization_patterns() {
            let general = assertion.generalize(&pattern, reason)?;
            let general = self.get_or_create(general)?;
            self.add_support(
                &general.reason_id(),
                &[Factor::new(reason.clone(), 1.0), Factor::of(assertion, 1.0)],
            )?;
            for expression in &expressions {
                let ge = self.get_or_create(expression.generalize(&pattern, &general, reason)?)?;
                self.add_support(
                    &ge.reason_id(),
                    &[Factor::new(reason.clone(), 1.0), Factor::of(expression, 1.0)],
                )?;
            }
            made.push(general);
        }
        debug!(count = made.len(), "generalized assertion");
        self.reload_all(made)
    }

    fn reload_all(&self, assertions: Vec<Assertion>) -> ConceptDbResult<Vec<Assertion>> {
        assertions
            .into_iter()
            .map(|a| {
                let id = a.reason_id();
                Ok(self.load::<Assertion>(&id)?.unwrap_or(a))
            })
            .collect()
    }

    // --- Reasons ---

    /// Record that the conjunction of `factors` votes `vote` on `target`.
    ///
    /// Upserts the reason record and, when `target` names a stored entity,
    /// adds the conjunction to that entity's justification (supporting for
    /// votes of one half and above, opposing below). The record weight is
    /// the Hamacher product of the factor weights.
    #[instrument(skip_all, fields(id = %target, factors = factors.len(), vote = vote))]
    pub fn add_reason(
        &self,
        target: &ReasonId,
        factors: &[Factor],
        vote: f64,
    ) -> ConceptDbResult<ReasonRecord> {
        if !vote.is_finite() {
            return Err(ConceptDbError::InvalidArgument(format!(
                "vote {vote} is not finite"
            )));
        }
        let conjunction = Conjunction::new(factors.iter().cloned())?;
        let ids: Vec<ReasonId> = conjunction.ids().cloned().collect();
        let weight = combine::hamacher(conjunction.factors().iter().map(|(_, w)| *w));
        let side = Polarity::from_vote(vote);

        self.locks.with_lock(&target.to_string(), || {
            let record = self.reasons.make(target, &ids, vote, weight)?;
            let attached = self
                .update_justified(target, |entity| {
                    entity
                        .justification_mut()
                        .add_conjunction(side, conjunction);
                    Ok(())
                })?
                .is_some();
            debug!(record = %record.id, side = side.as_str(), attached, "reason recorded");
            Ok(record)
        })
    }

    pub fn add_support(&self, target: &ReasonId, factors: &[Factor]) -> ConceptDbResult<ReasonRecord> {
        self.add_reason(target, factors, SUPPORT_VOTE)
    }

    pub fn add_oppose(&self, target: &ReasonId, factors: &[Factor]) -> ConceptDbResult<ReasonRecord> {
        self.add_reason(target, factors, OPPOSE_VOTE)
    }

    pub fn reasons_for(&self, target: &ReasonId) -> ConceptDbResult<Vec<ReasonRecord>> {
        self.reasons.by_target(target)
    }

    // --- Confidence ---

    /// Stored confidence, neutral when nothing is stored.
    pub fn confidence(&self, id: &ReasonId) -> ConceptDbResult<Confidence> {
        self.confidences.get(id)
    }

    /// Cheap local estimate from the votes of the reasons targeting `id`.
    pub fn calculate(&self, id: &ReasonId) -> ConceptDbResult<f64> {
        let records = self.reasons.by_target(id)?;
        Ok(combine::weighted_vote(
            self.config.default_confidence,
            self.config.default_weight,
            records.iter().map(|r| (r.vote, r.weight)),
        ))
    }

    /// Recompute and store the local confidence of `id`.
    ///
    /// Entities use their justification; ids that name no entity fall back
    /// to [`JustificationEngine::calculate`].
    #[instrument(skip_all, fields(id = %id))]
    pub fn update_confidence(&self, id: &ReasonId) -> ConceptDbResult<f64> {
        let strict = self.config.strict_lookup;
        self.locks.with_lock(&id.to_string(), || {
            let score = match self.update_justified(id, |e| e.update_confidence(self, strict))? {
                Some(score) => score,
                None => {
                    let score = self.calculate(id)?;
                    self.confidences.set(id, Confidence::new(score))?;
                    score
                }
            };
            debug!(score, "confidence updated");
            Ok(score)
        })
    }

    /// Check the stored entity `id` and its justification.
    pub fn check_consistency(&self, id: &ReasonId) -> ConceptDbResult<()> {
        fn check<E: Entity>(engine: &JustificationEngine, id: &ReasonId) -> ConceptDbResult<E> {
            let entity = engine
                .load::<E>(id)?
                .ok_or_else(|| ConceptDbError::not_found(id))?;
            entity.check_consistency(engine)?;
            Ok(entity)
        }
        match id.kind() {
            EntityKind::Assertion => check::<Assertion>(self, id).map(|_| ()),
            EntityKind::Expression => {
                let e = check::<Expression>(self, id)?;
                let assertion = self
                    .load::<Assertion>(&e.assertion_id())?
                    .ok_or_else(|| ConceptDbError::not_found(e.assertion_id()))?;
                e.check_against(&assertion)
            }
            EntityKind::Sentence => check::<Sentence>(self, id).map(|_| ()),
            EntityKind::ExternalReason => check::<ExternalReason>(self, id).map(|_| ()),
            EntityKind::ReasonConjunction | EntityKind::Named => Err(ConceptDbError::InvalidArgument(
                format!("{id} does not name a justified entity"),
            )),
        }
    }
}

impl IEntityLookup for JustificationEngine {
    /// Entities resolve when stored; other ids resolve when a confidence has
    /// been stored for them.
    fn lookup(&self, id: &ReasonId) -> ConceptDbResult<Option<EntityRef>> {
        match id.kind() {
            EntityKind::ReasonConjunction | EntityKind::Named => Ok(self
                .confidences
                .get_stored(id)?
                .map(|c| EntityRef::new(id.clone(), c))),
            _ => {
                if self.entities.load_entity(id)?.is_none() {
                    return Ok(None);
                }
                Ok(Some(EntityRef::new(id.clone(), self.confidences.get(id)?)))
            }
        }
    }
}
