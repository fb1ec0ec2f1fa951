use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, BarGroup, Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthChar;

use crate::{
    metrics::MetricsDisplay,
    session::{SessionConfig, SessionState},
    ui::{charting, Board, CharTag, Palette},
};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const STATS_WIDTH: u16 = 26;

/// A UI Screen boundary: renders one phase of the session
pub trait Screen {
    fn render(&self, board: &Board, area: Rect, buf: &mut Buffer);
}

/// Typing screen - prompt, entry line and live stats
pub struct TypingScreen;

/// Summary screen - final stats and the per-character chart
pub struct SummaryScreen;

/// Idle screen - shown between runs
pub struct IdleScreen;

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: SessionState) -> Box<dyn Screen> {
    match state {
        SessionState::Idle | SessionState::Reset => Box::new(IdleScreen),
        SessionState::ShowingSummary => Box::new(SummaryScreen),
        SessionState::AwaitingFirstKey
        | SessionState::Running
        | SessionState::Finished
        | SessionState::Terminated => Box::new(TypingScreen),
    }
}

fn stat_lines(
    config: &SessionConfig,
    display: &MetricsDisplay,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let header = Style::default().add_modifier(Modifier::BOLD);
    let value = Style::default().fg(palette.stats).add_modifier(Modifier::BOLD);

    [
        (config.display_time, "Time", &display.time),
        (config.display_precision, "Precision", &display.precision),
        (config.display_chars_per_minute, "CPM", &display.cpm),
        (config.display_words_per_minute, "WPM", &display.wpm),
    ]
    .into_iter()
    .filter(|(enabled, _, _)| *enabled)
    .map(|(_, name, val)| {
        Line::from(vec![
            Span::styled(format!("{name:<11}"), header),
            Span::styled(val.clone(), value),
        ])
    })
    .collect()
}

fn text_spans(board: &Board) -> Vec<Span<'static>> {
    let palette = &board.palette;
    let base = Style::default().fg(palette.text);

    board
        .chars
        .iter()
        .zip(&board.tags)
        .chunk_by(|(_, tag)| **tag)
        .into_iter()
        .map(|(tag, group)| {
            let text: String = group.map(|(c, _)| *c).collect();
            let style = match tag {
                CharTag::Pending => base,
                CharTag::Current => base
                    .fg(palette.current)
                    .add_modifier(Modifier::UNDERLINED | Modifier::BOLD),
                CharTag::Correct => base.fg(palette.correct),
                CharTag::Incorrect => base.fg(palette.incorrect),
            };
            Span::styled(text, style)
        })
        .collect()
}

/// Row that `chars[index]` lands on when the text is wrapped at word
/// boundaries into `width` columns. Words wider than a line are split.
fn wrapped_row(chars: &[char], width: usize, index: usize) -> usize {
    let width = width.max(1);
    let (mut row, mut col) = (0, 0);
    let mut start = 0;

    while start < chars.len() {
        if chars[start] == ' ' {
            if start == index {
                return row;
            }
            col += 1;
            start += 1;
            continue;
        }

        let end = chars[start..]
            .iter()
            .position(|c| *c == ' ')
            .map_or(chars.len(), |n| start + n);
        let word_width: usize = chars[start..end]
            .iter()
            .map(|c| c.width().unwrap_or(0))
            .sum();
        if col > 0 && col + word_width > width {
            row += 1;
            col = 0;
        }

        for (i, c) in chars.iter().enumerate().take(end).skip(start) {
            let w = c.width().unwrap_or(0);
            if col + w > width {
                row += 1;
                col = 0;
            }
            if i == index {
                return row;
            }
            col += w;
        }
        start = end;
    }

    row
}

impl Screen for TypingScreen {
    fn render(&self, board: &Board, area: Rect, buf: &mut Buffer) {
        let show_stats = board.config.display_stats();
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(if show_stats {
                vec![Constraint::Min(20), Constraint::Length(STATS_WIDTH)]
            } else {
                vec![Constraint::Min(20)]
            })
            .split(area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(columns[0]);

        let inner_width = rows[0].width.saturating_sub(2).max(1) as usize;
        let visible_rows = rows[0].height.saturating_sub(2).max(1) as usize;
        let current = board
            .tags
            .iter()
            .position(|tag| *tag == CharTag::Current)
            .unwrap_or(0);
        // keep the current word near the middle once the text overflows
        let row = wrapped_row(&board.chars, inner_width, current);
        let scroll = if row < visible_rows {
            0
        } else {
            row - visible_rows / 2
        };

        Paragraph::new(Line::from(text_spans(board)))
            .block(Block::default().borders(Borders::ALL).title("Typing"))
            .wrap(Wrap { trim: false })
            .scroll((scroll as u16, 0))
            .render(rows[0], buf);

        Paragraph::new(board.entry.as_str())
            .block(Block::default().borders(Borders::ALL))
            .render(rows[1], buf);

        let hint = if board.state == SessionState::AwaitingFirstKey {
            "start typing to begin the timer / (esc)ape"
        } else {
            "(space) submit word / (enter) finish early / (esc)ape"
        };
        Paragraph::new(Span::styled(
            hint,
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(rows[2], buf);

        if show_stats {
            Paragraph::new(stat_lines(&board.config, &board.display, &board.palette))
                .block(Block::default().borders(Borders::ALL).title("Statistics"))
                .render(columns[1], buf);
        }
    }
}

impl Screen for SummaryScreen {
    fn render(&self, board: &Board, area: Rect, buf: &mut Buffer) {
        let Some(summary) = &board.summary else {
            return;
        };

        let stats = if summary.show_stats {
            stat_lines(&board.config, &summary.display, &board.palette)
        } else {
            vec![]
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(if stats.is_empty() { 0 } else { stats.len() as u16 + 2 }),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        if !stats.is_empty() {
            Paragraph::new(stats)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("Summary ({})", summary.ended)),
                )
                .render(chunks[0], buf);
        }

        if let Some(accuracy) = &summary.accuracy_by_char {
            let bars = charting::accuracy_bars(accuracy, &board.palette);
            let inner_width = chunks[1].width.saturating_sub(2);
            BarChart::default()
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Precision By Character"),
                )
                .data(BarGroup::default().bars(&bars))
                .bar_width(charting::bar_width(accuracy.len(), inner_width))
                .bar_gap(1)
                .max(100)
                .render(chunks[1], buf);
        }

        Paragraph::new(Span::styled(
            "(esc) close summary",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[2], buf);
    }
}

impl Screen for IdleScreen {
    fn render(&self, _board: &Board, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(45),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(area);

        Paragraph::new(vec![
            Line::from(Span::styled(
                "Typing Speed Test",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "(enter) another round / (esc)ape",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
        ])
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_source::TargetText;

    #[test]
    fn stat_lines_follow_display_flags() {
        let config = SessionConfig {
            display_precision: false,
            display_words_per_minute: false,
            ..SessionConfig::default()
        };
        let lines = stat_lines(&config, &MetricsDisplay::default(), &Palette::default());

        let rendered: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].starts_with("Time"));
        assert!(rendered[0].ends_with("0:00"));
        assert!(rendered[1].starts_with("CPM"));
    }

    #[test]
    fn text_spans_group_runs_of_equal_tags() {
        let mut board = Board::new(SessionConfig::default(), Palette::default());
        board.chars = "ab cd ".chars().collect();
        board.tags = vec![
            CharTag::Correct,
            CharTag::Correct,
            CharTag::Pending,
            CharTag::Current,
            CharTag::Current,
            CharTag::Pending,
        ];

        let spans = text_spans(&board);

        let contents: Vec<&str> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(contents, vec!["ab", " ", "cd", " "]);
        assert!(spans[2].style.add_modifier.contains(Modifier::UNDERLINED));
    }

    fn buffer_text(buf: &Buffer) -> String {
        buf.content()
            .chunks(buf.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn wrapped_row_breaks_at_word_boundaries() {
        let chars: Vec<char> = "ab cd ef ".chars().collect();
        assert_eq!(wrapped_row(&chars, 5, 0), 0);
        assert_eq!(wrapped_row(&chars, 5, 3), 0);
        assert_eq!(wrapped_row(&chars, 5, 6), 1);

        let long: Vec<char> = "abcdefgh ".chars().collect();
        assert_eq!(wrapped_row(&long, 3, 2), 0);
        assert_eq!(wrapped_row(&long, 3, 3), 1);
        assert_eq!(wrapped_row(&long, 3, 7), 2);
    }

    #[test]
    fn typing_view_shows_every_long_word() {
        let words: Vec<String> = ['a', 'b', 'c', 'd']
            .iter()
            .map(|c| c.to_string().repeat(34))
            .collect();
        let mut board = Board::new(SessionConfig::default(), Palette::default());
        board.load_text(&TargetText::from_words(words.clone()));
        board.state = SessionState::Running;
        let area = Rect::new(0, 0, 100, 30);
        let mut buf = Buffer::empty(area);

        TypingScreen.render(&board, area, &mut buf);

        let screen = buffer_text(&buf);
        for word in &words {
            assert!(screen.contains(word.as_str()), "missing {}", &word[..1]);
        }
    }

    #[test]
    fn typing_view_scrolls_to_the_current_word() {
        let config = SessionConfig {
            display_time: false,
            display_precision: false,
            display_chars_per_minute: false,
            display_words_per_minute: false,
            ..SessionConfig::default()
        };
        let words: Vec<String> = (0..40).map(|i| format!("word{i:02}")).collect();
        let mut board = Board::new(config, Palette::default());
        board.load_text(&TargetText::from_words(words));
        board.state = SessionState::Running;
        let last = board.chars.len() - 7;
        for (i, tag) in board.tags.iter_mut().enumerate() {
            *tag = if (last..last + 6).contains(&i) {
                CharTag::Current
            } else {
                CharTag::Correct
            };
        }
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);

        TypingScreen.render(&board, area, &mut buf);

        let screen = buffer_text(&buf);
        assert!(screen.contains("word39"));
        assert!(!screen.contains("word00"));
    }

    #[test]
    fn idle_and_reset_share_a_screen() {
        let board = Board::new(SessionConfig::default(), Palette::default());
        let area = Rect::new(0, 0, 60, 10);
        let mut a = Buffer::empty(area);
        let mut b = Buffer::empty(area);

        current_screen(SessionState::Idle).render(&board, area, &mut a);
        current_screen(SessionState::Reset).render(&board, area, &mut b);

        assert_eq!(a, b);
    }
}
