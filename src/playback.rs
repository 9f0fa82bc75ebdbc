//! Playback bridge: hands the toolkit's MIDI rendering to a player and
//! follows the player's clock by marking the sounding notes on the page.
//!
//! The player reports elapsed seconds; the toolkit maps milliseconds to the
//! notes sounding at that time and the page they sit on:
//!   `elements = toolkit.elements_at_time(seconds * 1000)`

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use serde::Serialize;

use crate::display::{NotationToolkit, ScoreDisplay};
use crate::error::{Result, ScoreError};
use crate::page::ScoreSurface;

/// Class carried by the notes currently sounding.
pub const PLAYING_CLASS: &str = "playing";

const MIDI_DATA_URL_PREFIX: &str = "data:audio/midi;base64,";

/// The external MIDI player.
pub trait MidiPlayer {
    /// Start playing a `data:audio/midi` URL from the beginning.
    fn play(&mut self, data_url: &str);

    fn seek(&mut self, seconds: f64);

    fn stop(&mut self);
}

/// Wrap a standard MIDI file in a data URL the player accepts.
pub fn midi_data_url(midi: &[u8]) -> String {
    format!("{MIDI_DATA_URL_PREFIX}{}", STANDARD.encode(midi))
}

/// What a clock tick changed on the display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HighlightChange {
    /// Page rendered because the sounding notes moved to it
    pub page_changed: Option<u32>,
    /// Notes that stopped sounding
    pub removed: Vec<String>,
    /// Notes that started sounding
    pub added: Vec<String>,
}

impl HighlightChange {
    pub fn is_empty(&self) -> bool {
        self.page_changed.is_none() && self.removed.is_empty() && self.added.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PlaybackBridge {
    playing: Vec<String>,
    active: bool,
}

impl PlaybackBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Ids of the notes currently marked as sounding.
    pub fn playing_ids(&self) -> &[String] {
        &self.playing
    }

    /// Render the loaded score to MIDI and start the player.
    pub fn play<T: NotationToolkit, P: MidiPlayer>(&mut self, toolkit: &mut T, player: &mut P) -> Result<()> {
        let midi = toolkit.render_to_midi()?;
        debug!("Playing {} bytes of MIDI", midi.len());
        player.play(&midi_data_url(&midi));
        self.active = true;
        Ok(())
    }

    /// Start playing, then jump to the onset of `element_id`. Returns the
    /// seek position in seconds.
    pub fn play_from<T: NotationToolkit, P: MidiPlayer>(
        &mut self,
        toolkit: &mut T,
        player: &mut P,
        element_id: &str,
    ) -> Result<f64> {
        let millis = toolkit
            .time_for_element(element_id)
            .ok_or_else(|| ScoreError::MissingElement(element_id.to_string()))?;
        self.play(toolkit, player)?;
        let seconds = millis / 1000.0;
        player.seek(seconds);
        Ok(seconds)
    }

    /// Stop the player and clear the sounding marks from `surface`.
    pub fn stop<P: MidiPlayer>(&mut self, player: &mut P, surface: Option<&mut dyn ScoreSurface>) {
        player.stop();
        if let Some(surface) = surface {
            for id in &self.playing {
                surface.remove_class(id, PLAYING_CLASS);
            }
        }
        self.playing.clear();
        self.active = false;
    }

    /// Follow the player clock. Renders another page when the sounding
    /// notes are not on the displayed one.
    pub fn on_time<T: NotationToolkit>(
        &mut self,
        seconds: f64,
        display: &mut ScoreDisplay<T>,
    ) -> Result<HighlightChange> {
        let elements = display.toolkit_mut().elements_at_time(seconds * 1000.0);
        if elements.page == 0 {
            return Ok(HighlightChange::default());
        }

        let mut change = HighlightChange::default();
        if elements.page != display.current_page() {
            change.page_changed = Some(display.goto_page(elements.page)?);
        }
        if change.page_changed.is_none() && elements.notes == self.playing {
            return Ok(change);
        }

        let Some(page) = display.page_mut() else {
            warn!("No page displayed, cannot highlight {} notes", elements.notes.len());
            return Ok(change);
        };
        for id in &self.playing {
            if page.remove_class(id, PLAYING_CLASS) {
                change.removed.push(id.clone());
            }
        }
        for id in &elements.notes {
            if page.add_class(id, PLAYING_CLASS) {
                change.added.push(id.clone());
            }
        }
        self.playing = elements.notes;
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_is_base64_midi() {
        assert_eq!(midi_data_url(b"MThd"), "data:audio/midi;base64,TVRoZA==");
        assert_eq!(midi_data_url(&[]), "data:audio/midi;base64,");
    }
}
