//! Replication: authority → observers
//!
//! Authority симулирует AI и каждый тик публикует `AiSnapshot` (битовый
//! `AgentSnapshot`) для сущностей с маркером `Replicated`. Observer не
//! запускает `enemy_ai_update`, а перезаписывает состояние пришедшими snapshot.
//!
//! Transport вне crate: он забирает `AiSnapshot` у authority и пишет их в
//! observer app. Последний пришедший snapshot побеждает, без переупорядочивания.

use bevy::prelude::*;

use crate::ai::EnemyAi;
use crate::components::{EntityId, SteeringIntents};
use crate::logger;

pub mod bits;
pub mod codec;

pub use bits::{BitReader, BitWriter};
pub use codec::{AgentSnapshot, DecodeError, MAX_SNAPSHOT_BITS};

/// Replicated marker component
///
/// Только сущности с маркером попадают в snapshot поток.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Replicated;

/// Роль этого app в репликации
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplicationRole {
    /// Симулирует AI и публикует snapshots
    #[default]
    Authority,
    /// Только применяет snapshots
    Observer,
}

/// Закодированный snapshot одного агента
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct AiSnapshot {
    pub entity_id: EntityId,
    pub bytes: Vec<u8>,
}

fn authority(role: Option<Res<ReplicationRole>>) -> bool {
    role.map_or(true, |role| *role == ReplicationRole::Authority)
}

/// Run condition: AI симулируется только на authority (нет ресурса = authority)
pub fn is_authority(role: Option<Res<ReplicationRole>>) -> bool {
    authority(role)
}

pub fn is_observer(role: Option<Res<ReplicationRole>>) -> bool {
    !authority(role)
}

/// Применить входящие байты к AI
///
/// Невалидный snapshot отбрасывается, состояние не меняется. В debug
/// сборках причина уходит в logger.
pub fn receive_snapshot(ai: &mut EnemyAi, bytes: &[u8]) -> Option<AgentSnapshot> {
    match AgentSnapshot::from_bytes(bytes) {
        Ok(snapshot) => {
            ai.apply_agent_state(&snapshot);
            Some(snapshot)
        }
        Err(error) => {
            if cfg!(debug_assertions) {
                logger::log_warning(&format!(
                    "AI snapshot discarded ({} bytes): {}",
                    bytes.len(),
                    error
                ));
            }
            None
        }
    }
}

/// Система (authority): публикация snapshots по возрастанию EntityId
pub fn publish_ai_snapshots(
    agents: Query<(&EntityId, &EnemyAi, &SteeringIntents), With<Replicated>>,
    mut snapshots: EventWriter<AiSnapshot>,
) {
    let mut outgoing: Vec<AiSnapshot> = agents
        .iter()
        .map(|(id, ai, steering)| AiSnapshot {
            entity_id: *id,
            bytes: ai.agent_state(steering.wander_angle).to_bytes(),
        })
        .collect();
    outgoing.sort_by_key(|snapshot| snapshot.entity_id);

    for snapshot in outgoing {
        snapshots.write(snapshot);
    }
}

/// Система (observer): применение входящих snapshots
pub fn apply_ai_snapshots(
    mut snapshots: EventReader<AiSnapshot>,
    mut agents: Query<(&EntityId, &mut EnemyAi, &mut SteeringIntents), With<Replicated>>,
) {
    for incoming in snapshots.read() {
        let Some((_, mut ai, mut steering)) = agents
            .iter_mut()
            .find(|(id, ..)| **id == incoming.entity_id)
        else {
            continue;
        };

        if let Some(snapshot) = receive_snapshot(&mut ai, &incoming.bytes) {
            steering.wander_angle = snapshot.wander_angle;
        }
    }
}

/// Replication Plugin
///
/// Роль по умолчанию: Authority (single-player / сервер).
pub struct ReplicationPlugin;

impl Plugin for ReplicationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ReplicationRole>()
            .add_event::<AiSnapshot>();
    }
}
