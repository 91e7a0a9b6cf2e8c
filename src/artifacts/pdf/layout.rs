//! Word wrap and pagination for plain-text PDF output.

/// Page size, margins and type settings, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub leading: f32,
}

impl PageGeometry {
    /// A4 with 40pt margins and 11pt type.
    pub fn a4() -> Self {
        Self {
            width: 595.2756,
            height: 841.8898,
            margin: 40.0,
            font_size: 11.0,
            leading: 11.0 * 1.2,
        }
    }

    pub fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Baseline of the first line on a page.
    pub fn top(&self) -> f32 {
        self.height - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Lay `text` out into pages of lines.
///
/// Each input line is wrapped to the usable width; blank input lines stay as
/// one blank output line. After each line the cursor moves down by the
/// leading, and once it drops below the bottom margin the page is closed.
/// Always returns at least one page.
pub fn layout<F>(text: &str, geometry: &PageGeometry, measure: F) -> Vec<Vec<String>>
where
    F: Fn(&str) -> f32,
{
    let mut pages = Vec::new();
    let mut page = Vec::new();
    let mut y = geometry.top();

    let mut emit = |line: String, page: &mut Vec<String>| {
        page.push(line);
        y -= geometry.leading;
        if y < geometry.margin {
            pages.push(std::mem::take(page));
            y = geometry.top();
        }
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            emit(String::new(), &mut page);
            continue;
        }
        for wrapped in wrap_line(line, geometry.usable_width(), &measure) {
            emit(wrapped, &mut page);
        }
    }

    if !page.is_empty() || pages.is_empty() {
        pages.push(page);
    }
    pages
}

/// Greedy word wrap by measured width. Words wider than the line are split
/// between characters.
pub fn wrap_line<F>(line: &str, max_width: f32, measure: &F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut out = Vec::new();
    let mut current = String::new();

    for word in line.split(' ').filter(|w| !w.is_empty()) {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if measure(word) <= max_width {
            current = word.to_string();
            continue;
        }

        for ch in word.chars() {
            let mut next = current.clone();
            next.push(ch);
            if !current.is_empty() && measure(&next) > max_width {
                out.push(std::mem::replace(&mut current, ch.to_string()));
            } else {
                current = next;
            }
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}
