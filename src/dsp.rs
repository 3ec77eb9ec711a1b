pub mod spectrogram;
pub mod stft;
pub mod window;

use crate::error::Result;

/// Components whose cached output depends on their configuration.
///
/// Applying a new configuration recomputes everything derived from it; on error the
/// previous configuration and its output stay in place.
pub trait Reconfigurable<Cfg> {
    fn update_config(&mut self, config: Cfg) -> Result<()>;
}
