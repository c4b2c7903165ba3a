//! Deferred mutation queue, played back onto a [`Repository`] at phase
//! boundaries.
//!
//! Modules never mutate the repository directly (§5); they queue ops here.
//! `CreateEntity` hands back an opaque placeholder that resolves to a real
//! entity only once the buffer plays back, so a module can reference an
//! entity it just "spawned" in later ops within the same tick.

use fdp_component::{Component, Diagnostic, Entity, ErrorKind};

use crate::repository::Repository;

/// An opaque handle to an entity that will exist after the next playback.
/// Distinct from [`Entity`] — it carries no generation and cannot be used
/// to query the repository until resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placeholder(u32);

/// The target of an operation: either a concrete, already-live entity, or a
/// placeholder created earlier in the same buffer.
#[derive(Debug, Clone, Copy)]
pub enum Target {
    Entity(Entity),
    Placeholder(Placeholder),
}

impl From<Entity> for Target {
    fn from(e: Entity) -> Self {
        Target::Entity(e)
    }
}

impl From<Placeholder> for Target {
    fn from(p: Placeholder) -> Self {
        Target::Placeholder(p)
    }
}

type ApplyFn = Box<dyn FnOnce(&mut Repository, &[Option<Entity>]) -> Result<(), ErrorKind> + Send>;
/// Checks an op's precondition against the repository's state *before*
/// playback started, without mutating. Targets that are still-unresolved
/// placeholders are assumed valid — they name entities this same playback
/// is about to create, so there is nothing pre-existing to check.
type ValidateFn = Box<dyn Fn(&Repository) -> Result<(), ErrorKind> + Send>;

enum Op {
    CreateEntity,
    DestroyEntity(Target),
    Mutate(Target, ValidateFn, ApplyFn),
    SetSingleton(Box<dyn FnOnce(&mut Repository) + Send>),
}

/// How playback handles an operation that fails validation (e.g. its
/// target was destroyed earlier in the same buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPolicy {
    /// Skip the failing op, emit a diagnostic, continue with the rest. The
    /// default (§4.2).
    Lenient,
    /// Abort the whole playback; the repository is left exactly as it was
    /// before this call.
    Strict,
}

/// Outcome of a [`CommandBuffer::playback`] call.
#[derive(Debug, Default)]
pub struct PlaybackReport {
    pub applied: usize,
    pub skipped: usize,
    pub diagnostics: Vec<Diagnostic>,
    /// Entities created by this playback's `CreateEntity` ops, in the same
    /// order the matching placeholders were handed out by `create_entity`.
    pub created: Vec<Entity>,
}

/// Records operations in insertion order; `playback` replays them as one
/// logical transaction, advancing `GlobalVersion` once at the end rather
/// than per structural op.
///
/// Capacity is pre-reserved at construction; `clear` resets length without
/// shrinking, so a buffer sized once at world construction never
/// reallocates on the tick hot path.
pub struct CommandBuffer {
    ops: Vec<Op>,
    next_placeholder: u32,
}

impl std::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("ops_len", &self.ops.len())
            .field("next_placeholder", &self.next_placeholder)
            .finish()
    }
}

impl CommandBuffer {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
            next_placeholder: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.next_placeholder = 0;
    }

    /// Queue a new entity. The returned placeholder is valid for referencing
    /// within this same buffer; it resolves to a real [`Entity`] at
    /// playback.
    pub fn create_entity(&mut self) -> Placeholder {
        let p = Placeholder(self.next_placeholder);
        self.next_placeholder += 1;
        self.ops.push(Op::CreateEntity);
        p
    }

    pub fn destroy_entity(&mut self, target: impl Into<Target>) {
        self.ops.push(Op::DestroyEntity(target.into()));
    }

    pub fn add_component<T: Component>(&mut self, target: impl Into<Target>, value: T) {
        self.push_mutate::<T>(
            target,
            |repo| {
                if repo.type_id_of::<T>().is_some() {
                    Ok(())
                } else {
                    Err(ErrorKind::Misuse)
                }
            },
            move |repo, entity| repo.add_component(entity, value),
        );
    }

    pub fn set_component<T: Component>(&mut self, target: impl Into<Target>, value: T) {
        self.push_mutate::<T>(
            target,
            |repo| {
                if repo.type_id_of::<T>().is_some() {
                    Ok(())
                } else {
                    Err(ErrorKind::Misuse)
                }
            },
            move |repo, entity| repo.set_component(entity, value),
        );
    }

    pub fn remove_component<T: Component>(&mut self, target: impl Into<Target>) {
        let target_copy = target.into();
        self.push_mutate::<T>(
            target_copy,
            move |repo| match target_copy {
                Target::Placeholder(_) => Ok(()),
                Target::Entity(e) => {
                    if repo.has_component::<T>(e) {
                        Ok(())
                    } else {
                        Err(ErrorKind::NotFound)
                    }
                }
            },
            move |repo, entity| {
                if repo.remove_component::<T>(entity) {
                    Ok(())
                } else {
                    Err(ErrorKind::NotFound)
                }
            },
        );
    }

    pub fn set_singleton<T: Component>(&mut self, value: T) {
        self.ops
            .push(Op::SetSingleton(Box::new(move |repo| repo.set_singleton(value))));
    }

    fn push_mutate<T: Component>(
        &mut self,
        target: impl Into<Target>,
        validate: impl Fn(&Repository) -> Result<(), ErrorKind> + Send + 'static,
        f: impl FnOnce(&mut Repository, Entity) -> Result<(), ErrorKind> + Send + 'static,
    ) {
        let target = target.into();
        let apply: ApplyFn = Box::new(move |repo, resolved| {
            let entity = resolve(target, resolved)?;
            f(repo, entity)
        });
        self.ops
            .push(Op::Mutate(target, Box::new(validate), apply));
    }

    /// Replay every queued op against `repo` in order. Structural changes
    /// bump `GlobalVersion` once, at the end, not per op.
    ///
    /// Under [`PlaybackPolicy::Strict`], every op's precondition is checked
    /// against `repo`'s pre-playback state first; if any would fail, no op
    /// is applied and the repository is left exactly as it was.
    pub fn playback(&mut self, repo: &mut Repository, policy: PlaybackPolicy) -> PlaybackReport {
        let mut report = PlaybackReport::default();

        if policy == PlaybackPolicy::Strict {
            for op in &self.ops {
                let failure = match op {
                    Op::DestroyEntity(Target::Entity(e)) if !repo.is_alive(*e) => {
                        Some(ErrorKind::NotFound)
                    }
                    Op::Mutate(_, validate, _) => validate(repo).err(),
                    _ => None,
                };
                if let Some(kind) = failure {
                    let diagnostic =
                        Diagnostic::new(kind, "command buffer op failed strict validation");
                    tracing::warn!(%diagnostic, "rejecting strict playback, repository unchanged");
                    report.diagnostics.push(diagnostic);
                    self.ops.clear();
                    self.next_placeholder = 0;
                    return report;
                }
            }
        }

        let mut resolved: Vec<Option<Entity>> = Vec::new();
        repo.begin_batch();

        for op in self.ops.drain(..) {
            let result = match op {
                Op::CreateEntity => {
                    let entity = repo.create_entity();
                    resolved.push(Some(entity));
                    report.created.push(entity);
                    Ok(())
                }
                Op::DestroyEntity(target) => match resolve(target, &resolved) {
                    Ok(entity) => {
                        repo.destroy_entity(entity);
                        Ok(())
                    }
                    Err(kind) => Err(kind),
                },
                Op::Mutate(_, _, apply) => apply(repo, &resolved),
                Op::SetSingleton(apply) => {
                    apply(repo);
                    Ok(())
                }
            };

            match result {
                Ok(()) => report.applied += 1,
                Err(kind) => {
                    // Strict mode already rejected any buffer that would
                    // reach this; a failure here under lenient mode is
                    // simply skipped.
                    let diagnostic = Diagnostic::new(kind, "command buffer op failed validation");
                    tracing::warn!(%diagnostic, "skipping failed op");
                    report.skipped += 1;
                    report.diagnostics.push(diagnostic);
                }
            }
        }

        repo.end_batch();
        self.next_placeholder = 0;
        report
    }
}

fn resolve(target: Target, resolved: &[Option<Entity>]) -> Result<Entity, ErrorKind> {
    match target {
        Target::Entity(e) => Ok(e),
        Target::Placeholder(Placeholder(idx)) => resolved
            .get(idx as usize)
            .copied()
            .flatten()
            .ok_or(ErrorKind::NotFound),
    }
}
