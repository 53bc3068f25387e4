use supports_color::Stream;

pub struct Printer {
    pub use_color: bool,
}

impl Printer {
    pub fn new() -> Self {
        let use_color = supports_color::on(Stream::Stdout).is_some();
        Self { use_color }
    }

    pub fn success(&self, message: &str) {
        self.print_prefix("[+]", "green", message);
    }

    pub fn error(&self, message: &str) {
        self.print_prefix("[-]", "red", message);
    }

    pub fn warning(&self, message: &str) {
        self.print_prefix("[!]", "yellow", message);
    }

    pub fn info(&self, message: &str) {
        self.print_prefix("[?]", "cyan", message);
    }

    pub fn header(&self, title: &str) {
        if self.use_color {
            println!("\n\x1b[1;36m{}\x1b[0m", title);  // Bold cyan
            println!("\x1b[90m{}\x1b[0m", "─".repeat(title.chars().count()));
        } else {
            println!("\n{}", title);
            println!("{}", "─".repeat(title.chars().count()));
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.use_color {
            println!("\n\x1b[1m{}\x1b[0m", title);  // Bold
        } else {
            println!("\n{}", title);
        }
    }

    /// Multi-line replies keep their bullets aligned under the prefix.
    pub fn print_prefix(&self, prefix: &str, color: &str, message: &str) {
        let mut lines = message.lines();
        let first = lines.next().unwrap_or("");

        if self.use_color {
            println!("{}{}\x1b[0m {}", ansi_code(color), prefix, first);
        } else {
            println!("{} {}", prefix, first);
        }

        let indent = " ".repeat(prefix.chars().count() + 1);
        for line in lines {
            println!("{}{}", indent, line);
        }
    }

    pub fn print_key_value(&self, key: &str, value: &str, indent: usize) {
        let indent_str = " ".repeat(indent);
        if self.use_color {
            println!("{}\x1b[1m{}:\x1b[0m {}", indent_str, key, value);  // Bold key
        } else {
            println!("{}{}: {}", indent_str, key, value);
        }
    }

    pub fn print_list_item(&self, item: &str, indent: usize) {
        let indent_str = " ".repeat(indent);
        if self.use_color {
            println!("{}\x1b[36m•\x1b[0m {}", indent_str, item);  // Cyan bullet
        } else {
            println!("{}• {}", indent_str, item);
        }
    }

    /// Folder name tinted with its palette color.
    pub fn folder_label(&self, name: &str, color: &str) -> String {
        if self.use_color {
            format!("{}■\x1b[0m {}", ansi_code(color), name)
        } else {
            format!("■ {}", name)
        }
    }
}

fn ansi_code(color: &str) -> &'static str {
    match color {
        "green" | "teal" => "\x1b[32m",
        "red" => "\x1b[31m",
        "yellow" | "orange" => "\x1b[33m",
        "cyan" => "\x1b[36m",
        "blue" | "indigo" => "\x1b[34m",
        "magenta" | "purple" | "pink" => "\x1b[35m",
        _ => "\x1b[0m",
    }
}
