use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Where the reader gets its text, one line at a time.
pub trait LineSource {
    /// Next line without its terminator, or `None` at end of input.
    /// `show_prompt` is true for the first line of a new top-level form.
    fn read_line(&mut self, show_prompt: bool) -> io::Result<Option<String>>;

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Lines of an in-memory string, split on `\n` or `\r\n`.
pub struct LinesFromStr {
    lines: std::vec::IntoIter<String>,
}

impl LinesFromStr {
    pub fn new(text: &str) -> Self {
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        LinesFromStr {
            lines: lines.into_iter(),
        }
    }
}

impl LineSource for LinesFromStr {
    fn read_line(&mut self, _show_prompt: bool) -> io::Result<Option<String>> {
        Ok(self.lines.next())
    }
}

/// Lines of any buffered reader: a file, or piped stdin.
pub struct LinesFromReader<R: BufRead> {
    reader: R,
}

impl<R: BufRead> LinesFromReader<R> {
    pub fn new(reader: R) -> Self {
        LinesFromReader { reader }
    }
}

impl LinesFromReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            io::Error::new(e.kind(), format!("cannot open '{}': {}", path.as_ref().display(), e))
        })?;
        Ok(LinesFromReader::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LineSource for LinesFromReader<R> {
    fn read_line(&mut self, _show_prompt: bool) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// Standard input, locked per line so several readers can share it.
pub struct LinesFromStdin;

impl LineSource for LinesFromStdin {
    fn read_line(&mut self, _show_prompt: bool) -> io::Result<Option<String>> {
        LinesFromReader::new(io::stdin().lock()).read_line(false)
    }
}

/// Interactive terminal input with line editing and history.
pub struct LinesFromConsole {
    editor: DefaultEditor,
    primary: String,
    secondary: String,
}

impl LinesFromConsole {
    pub fn new() -> io::Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        Ok(LinesFromConsole {
            editor,
            primary: "> ".to_string(),
            secondary: "| ".to_string(),
        })
    }
}

impl LineSource for LinesFromConsole {
    fn read_line(&mut self, show_prompt: bool) -> io::Result<Option<String>> {
        let prompt = if show_prompt { &self.primary } else { &self.secondary };
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            // ^C abandons the current line only.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        println!("Goodbye");
        Ok(())
    }
}
