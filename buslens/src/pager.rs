use std::io::{self, IsTerminal, Write};
use std::process::{Child, Command, Stdio};

/// Streams rendered lines into `less`, or straight to stdout when paging is
/// off or the output is redirected. A broken pipe just means the reader
/// quit early, so it ends the stream silently.
pub fn display_lines(
    lines: impl Iterator<Item = String>,
    use_pager: bool,
) -> Result<(), io::Error> {
    if use_pager && io::stdout().is_terminal() {
        match spawn_pager() {
            Ok(mut pager) => {
                let result = write_lines(lines, pager.stdin.as_mut().expect("piped stdin"));
                drop(pager.stdin.take());
                pager.wait()?;
                return swallow_broken_pipe(result);
            }
            Err(err) => {
                log::warn!("could not start pager, falling back to stdout: {err}");
            }
        }
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    swallow_broken_pipe(write_lines(lines, &mut handle))
}

fn spawn_pager() -> Result<Child, io::Error> {
    Command::new("less")
        .args(["-R", "-S", "-#", "8"])
        .stdin(Stdio::piped())
        .spawn()
}

fn write_lines(
    lines: impl Iterator<Item = String>,
    sink: &mut impl Write,
) -> Result<(), io::Error> {
    for line in lines {
        writeln!(sink, "{line}")?;
    }
    sink.flush()
}

fn swallow_broken_pipe(result: Result<(), io::Error>) -> Result<(), io::Error> {
    match result {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
