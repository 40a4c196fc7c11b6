use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Identity of one impact effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImpactId(pub u64);

/// Looping sounds the tool can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    MiningLaser,
    TractorHum,
    RepairTorch,
}

/// Fire-and-forget request to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectRequest {
    BeamLine { from: Vec3, to: Vec3, color: Vec4 },
    BeamHidden,
    ImpactStart { id: ImpactId, point: Vec3, normal: Vec3 },
    ImpactMove { id: ImpactId, point: Vec3, normal: Vec3 },
    ImpactStop { id: ImpactId },
    SoundStart(SoundCue),
    SoundStop(SoundCue),
}

/// Receives effect requests. Implementations must not call back into the tool.
pub trait EffectSink {
    fn emit(&mut self, request: EffectRequest);
}

/// Discards everything; stands in for a missing presentation layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEffects;

impl EffectSink for NullEffects {
    fn emit(&mut self, _request: EffectRequest) {}
}

/// Records requests in order.
#[derive(Debug, Clone, Default)]
pub struct EffectLog {
    pub requests: Vec<EffectRequest>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoints of the most recent beam line, unless it was hidden since.
    pub fn last_beam(&self) -> Option<(Vec3, Vec3)> {
        self.requests.iter().rev().find_map(|r| match r {
            EffectRequest::BeamLine { from, to, .. } => Some(Some((*from, *to))),
            EffectRequest::BeamHidden => Some(None),
            _ => None,
        })?
    }

    /// Impacts started and not yet stopped.
    pub fn live_impacts(&self) -> Vec<ImpactId> {
        let mut live = Vec::new();
        for r in &self.requests {
            match r {
                EffectRequest::ImpactStart { id, .. } => live.push(*id),
                EffectRequest::ImpactStop { id } => live.retain(|l| l != id),
                _ => {}
            }
        }
        live
    }

    /// Sounds started and not yet stopped.
    pub fn playing_sounds(&self) -> Vec<SoundCue> {
        let mut playing = Vec::new();
        for r in &self.requests {
            match r {
                EffectRequest::SoundStart(cue) => playing.push(*cue),
                EffectRequest::SoundStop(cue) => playing.retain(|c| c != cue),
                _ => {}
            }
        }
        playing
    }
}

impl EffectSink for EffectLog {
    fn emit(&mut self, request: EffectRequest) {
        self.requests.push(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_beam_respects_hidden() {
        let mut log = EffectLog::new();
        log.emit(EffectRequest::BeamLine {
            from: Vec3::ZERO,
            to: Vec3::Z,
            color: Vec4::ONE,
        });
        assert_eq!(log.last_beam(), Some((Vec3::ZERO, Vec3::Z)));
        log.emit(EffectRequest::BeamHidden);
        assert_eq!(log.last_beam(), None);
    }

    #[test]
    fn live_impacts_tracks_start_and_stop() {
        let mut log = EffectLog::new();
        log.emit(EffectRequest::ImpactStart {
            id: ImpactId(1),
            point: Vec3::ZERO,
            normal: Vec3::Y,
        });
        assert_eq!(log.live_impacts(), vec![ImpactId(1)]);
        log.emit(EffectRequest::ImpactStop { id: ImpactId(1) });
        assert!(log.live_impacts().is_empty());
    }
}
