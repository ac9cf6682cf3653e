use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use super::AudioSink;
use crate::controller::Signal;
use crate::error::AudioError;
use crate::playlist::Track;

const END_POLL: Duration = Duration::from_millis(250);

enum AudioCommand {
    Play { path: PathBuf, generation: u64 },
    Pause,
    Resume,
    Stop,
    Cue(PathBuf),
}

/// Device-backed sink. rodio's stream is not `Send`, so it lives on a
/// dedicated thread and this handle only sends it commands.
pub struct RodioSink {
    tx: Sender<AudioCommand>,
    music_dir: PathBuf,
    cue: Option<PathBuf>,
}

impl RodioSink {
    /// Open the default output device.
    ///
    /// `cue` is resolved against `music_dir`. End-of-track reports go to
    /// `signals`.
    pub fn spawn(
        music_dir: PathBuf,
        cue: Option<&str>,
        volume: f32,
        signals: UnboundedSender<Signal>,
    ) -> Result<Self, AudioError> {
        let (tx, rx) = mpsc::channel::<AudioCommand>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), AudioError>>(1);

        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(AudioError::Device(e.to_string())));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let volume = volume.clamp(0.0, 1.0);
                let mut current: Option<(Sink, u64)> = None;

                loop {
                    match rx.recv_timeout(END_POLL) {
                        Ok(AudioCommand::Play { path, generation }) => {
                            if let Some((old, _)) = current.take() {
                                old.stop();
                            }
                            match open_sink(&handle, &path) {
                                Ok(sink) => {
                                    sink.set_volume(volume);
                                    current = Some((sink, generation));
                                }
                                Err(e) => warn!("{e}"),
                            }
                        }
                        Ok(AudioCommand::Pause) => {
                            if let Some((sink, _)) = &current {
                                sink.pause();
                            }
                        }
                        Ok(AudioCommand::Resume) => {
                            if let Some((sink, _)) = &current {
                                sink.play();
                            }
                        }
                        Ok(AudioCommand::Stop) => {
                            if let Some((old, _)) = current.take() {
                                old.stop();
                            }
                        }
                        Ok(AudioCommand::Cue(path)) => match open_sink(&handle, &path) {
                            Ok(sink) => sink.detach(),
                            Err(e) => warn!("{e}"),
                        },
                        Err(RecvTimeoutError::Timeout) => {
                            let finished = current
                                .as_ref()
                                .is_some_and(|(sink, _)| !sink.is_paused() && sink.empty());
                            if finished {
                                if let Some((_, generation)) = current.take() {
                                    debug!(generation, "track finished");
                                    let _ = signals.send(Signal::TrackEnded { generation });
                                }
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| AudioError::Device(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| AudioError::EngineGone)??;

        Ok(Self {
            tx,
            cue: cue.map(|c| music_dir.join(c)),
            music_dir,
        })
    }

    fn send(&self, cmd: AudioCommand) -> Result<(), AudioError> {
        self.tx.send(cmd).map_err(|_| AudioError::EngineGone)
    }
}

fn open_sink(handle: &OutputStreamHandle, path: &Path) -> Result<Sink, AudioError> {
    let track_err = |message: String| AudioError::Track {
        path: path.to_path_buf(),
        message,
    };
    let file = File::open(path).map_err(|e| track_err(e.to_string()))?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| track_err(e.to_string()))?;
    let sink = Sink::try_new(handle).map_err(|e| AudioError::Device(e.to_string()))?;
    sink.append(source);
    Ok(sink)
}

impl AudioSink for RodioSink {
    fn play(&mut self, track: &Track, generation: u64) -> Result<(), AudioError> {
        let path = track.resolve(&self.music_dir);
        if !path.is_file() {
            return Err(AudioError::Track {
                path,
                message: "file not found".into(),
            });
        }
        self.send(AudioCommand::Play { path, generation })
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.send(AudioCommand::Resume)
    }

    fn pause(&mut self) {
        let _ = self.send(AudioCommand::Pause);
    }

    fn stop(&mut self) {
        let _ = self.send(AudioCommand::Stop);
    }

    fn play_cue(&mut self) -> Result<(), AudioError> {
        match &self.cue {
            Some(path) => self.send(AudioCommand::Cue(path.clone())),
            None => Ok(()),
        }
    }
}
