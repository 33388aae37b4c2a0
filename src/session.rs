//! Capture sessions: bind the camera once, then capture/upload/display
//! per user trigger.

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::camera::{CameraError, CameraSettings, CameraStream, Frame};
use crate::display::{failure_line, print_result, verdict_line};
use crate::snapshot::{encode_capture, SnapshotError};
use crate::upload::{UploadClient, UploadError};

/// Errors that end a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolved settings for one session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Camera device index
    pub device: u32,
    /// Recognition server base URL
    pub server_url: String,
    /// JPEG quality for uploads
    pub quality: u8,
    /// How long one-shot capture waits for the first frame
    pub warmup: Duration,
}

fn camera_settings(opts: &SessionOptions) -> CameraSettings {
    CameraSettings {
        device_index: opts.device,
        ..Default::default()
    }
}

/// Capture a single frame, upload it, and print the verdict.
///
/// Returns the process exit code: 0 when a verdict line was displayed
/// (server errors included), 1 when the upload itself failed.
pub async fn run_once(opts: &SessionOptions) -> Result<i32, SessionError> {
    let mut stream = CameraStream::open(camera_settings(opts))?;
    stream.start()?;
    let frame = stream.wait_for_frame(opts.warmup)?;
    stream.stop();

    let jpeg = encode_capture(&frame, opts.quality)?;
    let client = UploadClient::with_base_url(opts.server_url.clone())?;

    match client.upload_capture(jpeg).await {
        Ok(verdict) => {
            print_result(&verdict_line(&verdict));
            Ok(0)
        }
        Err(e) => {
            log::error!("Upload failed: {}", e);
            print_result(&failure_line());
            Ok(1)
        }
    }
}

/// What one stdin line asks the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Trigger {
    /// Capture the current frame (bare Enter)
    Capture,
    /// End the session
    Quit,
    /// Anything else; reported back with a hint
    Unknown(String),
}

fn parse_trigger(line: &str) -> Trigger {
    match line.trim() {
        "" => Trigger::Capture,
        "q" | "quit" => Trigger::Quit,
        other => Trigger::Unknown(other.to_string()),
    }
}

/// Forward stdin lines over a channel from a dedicated thread.
///
/// Reading stdin directly in the session loop would park it inside a
/// blocking read, where a Ctrl+C flag flip goes unnoticed until the
/// next keypress. With the read on its own thread the loop can poll
/// both the channel and the stop flag.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    rx
}

/// Wait for the next trigger, giving up when the session stops.
///
/// Returns `None` on Ctrl+C (stop flag cleared) or stdin EOF, without
/// requiring a final keypress to notice either.
fn wait_for_trigger(input: &mpsc::Receiver<String>, running: &AtomicBool) -> Option<Trigger> {
    loop {
        if !running.load(Ordering::SeqCst) {
            return None;
        }
        match input.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => return Some(parse_trigger(&line)),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return None,
        }
    }
}

/// Interactive session: the stream stays bound, each Enter press
/// captures the current frame.
///
/// `q` (or EOF, or Ctrl+C) ends the session. A failed upload only ends
/// that one attempt; the loop keeps going.
pub async fn run_watch(opts: &SessionOptions) -> Result<(), SessionError> {
    let mut stream = CameraStream::open(camera_settings(opts))?;
    stream.start()?;

    if let Some((w, h)) = stream.actual_resolution() {
        println!("Camera {} ready ({}x{}).", opts.device, w, h);
    }
    println!("Press Enter to capture, 'q' to quit.");

    let running = Arc::new(AtomicBool::new(true));
    let running_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        running_flag.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not set up Ctrl+C handler: {}", e);
    }

    let client = UploadClient::with_base_url(opts.server_url.clone())?;
    let input = spawn_stdin_reader();

    loop {
        print!("capture> ");
        std::io::stdout().flush()?;

        match wait_for_trigger(&input, &running) {
            None | Some(Trigger::Quit) => break,
            Some(Trigger::Capture) => {
                capture_attempt(stream.latest_frame(), &client, opts.quality).await
            }
            Some(Trigger::Unknown(other)) => {
                println!(
                    "Unknown input '{}'. Press Enter to capture, 'q' to quit.",
                    other
                )
            }
        }
    }

    stream.stop();
    Ok(())
}

/// One capture attempt inside the interactive loop.
///
/// Never propagates an error: a missing frame or a failed upload is
/// reported and the session continues.
async fn capture_attempt(frame: Option<Frame>, client: &UploadClient, quality: u8) {
    let frame = match frame {
        Some(frame) => frame,
        None => {
            // Triggered before the stream produced anything; not fatal.
            println!("No frame from camera yet, try again.");
            return;
        }
    };

    let jpeg = match encode_capture(&frame, quality) {
        Ok(jpeg) => jpeg,
        Err(e) => {
            log::error!("Snapshot encoding failed: {}", e);
            print_result(&failure_line());
            return;
        }
    };

    match client.upload_capture(jpeg).await {
        Ok(verdict) => print_result(&verdict_line(&verdict)),
        Err(e) => {
            log::error!("Upload failed: {}", e);
            print_result(&failure_line());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> SessionOptions {
        SessionOptions {
            device: 0,
            server_url: "http://127.0.0.1:5000".to_string(),
            quality: 80,
            warmup: Duration::from_secs(3),
        }
    }

    #[test]
    fn test_camera_settings_use_device_index() {
        let mut opts = options();
        opts.device = 4;
        let settings = camera_settings(&opts);
        assert_eq!(settings.device_index, 4);
        // Resolution and fps come from camera defaults
        assert_eq!(settings.width, CameraSettings::default().width);
    }

    #[test]
    fn test_session_error_wraps_camera_error() {
        let err: SessionError = CameraError::NoDevices.into();
        assert_eq!(err.to_string(), "No cameras found");
    }

    #[test]
    fn test_session_error_wraps_upload_error() {
        let err: SessionError = UploadError::MalformedReply("nope".to_string()).into();
        assert!(err.to_string().contains("Malformed reply"));
    }

    #[test]
    fn test_parse_trigger() {
        assert_eq!(parse_trigger(""), Trigger::Capture);
        assert_eq!(parse_trigger("   "), Trigger::Capture);
        assert_eq!(parse_trigger("q"), Trigger::Quit);
        assert_eq!(parse_trigger("quit"), Trigger::Quit);
        assert_eq!(parse_trigger("help"), Trigger::Unknown("help".to_string()));
    }

    #[test]
    fn test_wait_for_trigger_delivers_line() {
        let (tx, rx) = mpsc::channel();
        let running = AtomicBool::new(true);
        tx.send("q".to_string()).unwrap();
        assert_eq!(wait_for_trigger(&rx, &running), Some(Trigger::Quit));
    }

    #[test]
    fn test_wait_for_trigger_ends_on_eof() {
        let (tx, rx) = mpsc::channel::<String>();
        drop(tx);
        let running = AtomicBool::new(true);
        assert_eq!(wait_for_trigger(&rx, &running), None);
    }

    #[test]
    fn test_wait_for_trigger_wakes_on_stop_without_input() {
        // Ctrl+C clears the flag while nothing arrives on stdin; the
        // wait must return without another keypress.
        let (tx, rx) = mpsc::channel::<String>();
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let waiter = thread::spawn(move || wait_for_trigger(&rx, &flag));

        thread::sleep(Duration::from_millis(50));
        running.store(false, Ordering::SeqCst);

        assert_eq!(waiter.join().unwrap(), None);
        drop(tx);
    }

    #[tokio::test]
    async fn test_capture_attempt_without_frame_does_not_upload() {
        // Triggering before the stream has produced a frame must not
        // panic; the attempt reports the missing frame and returns.
        let client = UploadClient::with_base_url("http://127.0.0.1:9".to_string()).unwrap();
        capture_attempt(None, &client, 80).await;
    }
}
