//! Test doubles for the path solvers.
//!
//! [`FakeRouter`] writes a small POSIX shell script that honours the
//! subprocess contract of [`ProcessPathSolver`](super::ProcessPathSolver), so
//! tests exercise real process spawning, file exchange and timeouts without a
//! GIS stack. [`CannedRouteServer`] answers every HTTP request with one fixed
//! response for exercising [`OsrmPathSolver`](super::OsrmPathSolver).

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use super::process::ProcessPathSolverConfig;

/// Length reported by [`RouterBehaviour::Route`] when asked to report one.
pub const SCRIPTED_LENGTH_M: f64 = 2_345.5;

/// Vertices of the line written by [`RouterBehaviour::Route`].
pub const SCRIPTED_LINE: [[f64; 2]; 3] = [[23.59, 46.77], [23.595, 46.775], [23.6, 46.78]];

/// What the fake router does after recording its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterBehaviour {
    /// Write [`SCRIPTED_LINE`], with a `length` property when `report_length`.
    Route {
        /// Whether the output feature carries a `length` attribute.
        report_length: bool,
    },
    /// Write a feature collection with no features.
    NoFeatures,
    /// Exit successfully without writing an output file.
    NoOutput,
    /// Print to stderr and exit with `code`.
    Fail {
        /// Exit code.
        code: i32,
        /// Text printed to stderr.
        stderr: String,
    },
    /// Sleep for `seconds` before exiting.
    Hang {
        /// Sleep duration in whole seconds.
        seconds: u32,
    },
    /// Write an output file that is not GeoJSON.
    Garbage,
}

/// A throwaway router script plus the directory it records into.
#[derive(Debug)]
pub struct FakeRouter {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl FakeRouter {
    /// Install a router script with the given behaviour.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary directory or script cannot be
    /// written.
    pub fn install(behaviour: &RouterBehaviour) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("fake-router-").tempdir()?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| io::Error::other(format!("{} is not UTF-8", path.display())))?;
        postroute_fs::write_file(&root.join("router.sh"), script(behaviour))?;
        postroute_fs::write_file(&root.join("network.gpkg"), "")?;
        Ok(Self { _dir: dir, root })
    }

    /// Solver configuration that runs this router through `sh`.
    pub fn config(&self) -> ProcessPathSolverConfig {
        ProcessPathSolverConfig::new("sh", self.root.join("network.gpkg"))
            .with_args([self.root.join("router.sh").to_string()])
    }

    /// Arguments of every run so far, one vector per run.
    ///
    /// # Errors
    ///
    /// Returns an error when the log cannot be read.
    pub fn runs(&self) -> io::Result<Vec<Vec<String>>> {
        let log = self.root.join("runs.log");
        if !postroute_fs::is_file(&log)? {
            return Ok(Vec::new());
        }
        let text = postroute_fs::read_to_string(&log)?;
        Ok(text
            .split("--\n")
            .filter(|run| !run.is_empty())
            .map(|run| run.lines().map(str::to_owned).collect())
            .collect())
    }

    /// The start layer the most recent run received.
    ///
    /// # Errors
    ///
    /// Returns an error when no run has happened yet.
    pub fn last_start_layer(&self) -> io::Result<String> {
        postroute_fs::read_to_string(&self.root.join("last_start.geojson"))
    }
}

fn script(behaviour: &RouterBehaviour) -> String {
    let action = match behaviour {
        RouterBehaviour::Route { report_length } => {
            let coordinates = SCRIPTED_LINE
                .iter()
                .map(|[x, y]| format!("[{x}, {y}]"))
                .collect::<Vec<_>>()
                .join(", ");
            let length = if *report_length {
                format!(", \"length\": {SCRIPTED_LENGTH_M}")
            } else {
                String::new()
            };
            format!(
                "cat > \"$output\" <<'GEOJSON'\n\
                 {{\"type\": \"FeatureCollection\", \"features\": [{{\"type\": \"Feature\", \
                 \"geometry\": {{\"type\": \"LineString\", \"coordinates\": [{coordinates}]}}, \
                 \"properties\": {{\"start\": \"a\", \"end\": \"b\", \"postcode\": null, \
                 \"city\": null, \"address\": null{length}}}}}]}}\n\
                 GEOJSON\n"
            )
        }
        RouterBehaviour::NoFeatures => {
            "printf '%s' '{\"type\": \"FeatureCollection\", \"features\": []}' > \"$output\"\n"
                .to_owned()
        }
        RouterBehaviour::NoOutput => "exit 0\n".to_owned(),
        RouterBehaviour::Fail { code, stderr } => {
            format!("printf '%s\\n' '{}' >&2\nexit {code}\n", stderr.replace('\'', ""))
        }
        RouterBehaviour::Hang { seconds } => format!("sleep {seconds}\n"),
        RouterBehaviour::Garbage => "printf 'not geojson' > \"$output\"\n".to_owned(),
    };
    format!(
        "#!/bin/sh\n\
         dir=$(dirname \"$0\")\n\
         printf '%s\\n' \"$@\" '--' >> \"$dir/runs.log\"\n\
         eval \"start=\\${{$(($# - 2))}}\"\n\
         eval \"output=\\${{$#}}\"\n\
         cp \"$start\" \"$dir/last_start.geojson\"\n\
         {action}"
    )
}

/// One-response HTTP server bound to a loopback port.
///
/// Every connection is answered with the same status and JSON body, and the
/// request line is recorded.
#[derive(Debug)]
pub struct CannedRouteServer {
    address: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedRouteServer {
    /// Start serving `body` with `status` on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot bind.
    pub fn start(status: u16, body: impl Into<String>) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let address = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let body = body.into();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let _ = answer(stream, status, &body, &recorded);
            }
        });
        Ok(Self { address, requests })
    }

    /// Base URL to hand to the solver.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Request lines received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

fn answer(
    stream: TcpStream,
    status: u16,
    body: &str,
    recorded: &Mutex<Vec<String>>,
) -> io::Result<()> {
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header == "\r\n" {
            break;
        }
    }
    if let Ok(mut guard) = recorded.lock() {
        guard.push(request_line.trim_end().to_owned());
    }
    let mut stream = reader.into_inner();
    write!(
        stream,
        "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()
}
