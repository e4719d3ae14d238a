//! Save/Load functionality for progression and balancing state
//!
//! Uses bincode for compact binary saves and serde_json for readable ones.
//! Everything is generic over `Read`/`Write`; the core never opens files.
//! Session state (projectiles, enemies, timers) is not persisted.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voidfire_logic::balance::DifficultyTier;
use voidfire_logic::synergy::SynergyKind;
use voidfire_logic::upgrades::WeaponExperience;
use voidfire_logic::weapons::WeaponKind;

use crate::systems::BalanceState;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Permanent player progression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressionSnapshot {
    pub difficulty: DifficultyTier,
    pub game_level: u32,
    pub upgrade_levels: BTreeMap<WeaponKind, u8>,
    pub experience: BTreeMap<WeaponKind, WeaponExperience>,
    pub discovered: BTreeSet<SynergyKind>,
}

/// Serializable snapshot of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub progression: ProgressionSnapshot,
    pub balance: BalanceState,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

fn check_version(data: SaveData) -> Result<SaveData, SaveError> {
    if data.version != SAVE_VERSION {
        log::warn!(
            "rejecting save with version {} (expected {})",
            data.version,
            SAVE_VERSION
        );
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }
    Ok(data)
}

fn bundle(progression: &ProgressionSnapshot, balance: &BalanceState) -> SaveData {
    SaveData {
        version: SAVE_VERSION,
        progression: progression.clone(),
        balance: balance.clone(),
    }
}

/// Save progression and balance state in binary form
pub fn save_session<W: Write>(
    writer: W,
    progression: &ProgressionSnapshot,
    balance: &BalanceState,
) -> Result<(), SaveError> {
    bincode::serialize_into(writer, &bundle(progression, balance))?;
    Ok(())
}

/// Load a binary save
pub fn load_session<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let data: SaveData = bincode::deserialize_from(reader)?;
    check_version(data)
}

/// Save progression and balance state as pretty-printed JSON
pub fn save_session_json<W: Write>(
    writer: W,
    progression: &ProgressionSnapshot,
    balance: &BalanceState,
) -> Result<(), SaveError> {
    serde_json::to_writer_pretty(writer, &bundle(progression, balance))?;
    Ok(())
}

/// Load a JSON save
pub fn load_session_json<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let data: SaveData = serde_json::from_reader(reader)?;
    check_version(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::engine::{CombatEngine, FrameInput};
    use voidfire_logic::math::Vec3;
    use voidfire_logic::synergy::PowerUpKind;

    fn played_engine() -> CombatEngine {
        let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
        engine.set_difficulty(DifficultyTier::Hard);
        engine.set_upgrade_level(WeaponKind::Plasma, 3);
        engine.equip_weapon(WeaponKind::Standard);
        engine.grant_power_up(PowerUpKind::RapidFire);
        let input = FrameInput {
            fire_held: true,
            aim: Vec3::FORWARD,
            target: None,
        };
        for _ in 0..120 {
            engine.update(1.0 / 60.0, &input);
        }
        engine
    }

    #[test]
    fn test_save_load_roundtrip() {
        let engine = played_engine();

        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).expect("Save failed");

        let mut loaded = CombatEngine::new(CombatConfig::default()).unwrap();
        loaded.load(&save_buffer[..]).expect("Load failed");

        assert_eq!(loaded.progression(), engine.progression());
        assert_eq!(loaded.balance().state(), engine.balance().state());
        assert_eq!(loaded.difficulty(), DifficultyTier::Hard);
        assert_eq!(loaded.upgrade_level(WeaponKind::Plasma), 3);
        assert!(loaded
            .synergy()
            .discovered()
            .contains(&SynergyKind::BulletHell));
    }

    #[test]
    fn test_json_roundtrip() {
        let engine = played_engine();
        let mut buf = Vec::new();
        save_session_json(&mut buf, &engine.progression(), engine.balance().state()).unwrap();
        let data = load_session_json(&buf[..]).unwrap();
        assert_eq!(data.progression, engine.progression());
        assert_eq!(&data.balance, engine.balance().state());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut data = bundle(&ProgressionSnapshot::default(), &BalanceState::default());
        data.version = SAVE_VERSION + 1;
        let bytes = bincode::serialize(&data).unwrap();
        assert!(matches!(
            load_session(&bytes[..]),
            Err(SaveError::VersionMismatch { found, .. }) if found == SAVE_VERSION + 1
        ));
    }

    #[test]
    fn test_truncated_save_is_error() {
        let engine = played_engine();
        let mut buf = Vec::new();
        engine.save(&mut buf).unwrap();
        buf.truncate(buf.len() / 2);
        assert!(load_session(&buf[..]).is_err());
    }
}
