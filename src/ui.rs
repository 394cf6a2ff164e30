use crossterm::{
    ExecutableCommand,
    event::{self, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap},
};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::Limits;
use crate::container::ChannelContainer;
use crate::feed_funcs::FeedClient;
use crate::news::fetch_and_render;
use crate::render_funcs::NewsView;
use crate::text_funcs::RenderedItem;

// --- UI Constants ---
const DARK_BG: Color = Color::Rgb(15, 15, 20);
const BORDER_MUTED: Color = Color::Rgb(50, 50, 60);
const NEWS_GOLD: Color = Color::Rgb(255, 170, 50);
const ERROR_RED: Color = Color::Rgb(235, 80, 80);
const DESC_GREY: Color = Color::Rgb(120, 120, 130);
const UI_GREY: Color = Color::Rgb(160, 160, 170);

const PREVIEW_LINES: usize = 3;

struct App {
    view: Option<NewsView>,
    rx: mpsc::UnboundedReceiver<NewsView>,
    offset: usize,
}

impl App {
    fn new(rx: mpsc::UnboundedReceiver<NewsView>) -> Self {
        Self {
            view: None,
            rx,
            offset: 0,
        }
    }

    fn item_count(&self) -> usize {
        match &self.view {
            Some(NewsView::Items(items)) => items.len(),
            _ => 0,
        }
    }

    fn scroll_down(&mut self) {
        if self.offset + 1 < self.item_count() {
            self.offset += 1;
        }
    }

    fn scroll_up(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }

    fn receive(&mut self) {
        while let Ok(view) = self.rx.try_recv() {
            self.view = Some(view);
            self.offset = 0;
        }
    }
}

/// Fetch once in the background and show the result full screen.
pub async fn run(client: Box<dyn FeedClient>, limits: Limits) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut container = ChannelContainer::new(tx);
        if let Err(err) = fetch_and_render(client.as_ref(), &mut container, limits).await {
            tracing::error!(error = %err, "Could not hand news to the viewer");
        }
    });

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let result = event_loop(App::new(rx));
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    result
}

fn event_loop(mut app: App) -> anyhow::Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    loop {
        app.receive();

        terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Block::default().bg(DARK_BG), area);

            let main_layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(5), Constraint::Length(1)])
                .split(area);

            render_news_block(frame, main_layout[0], &app);

            let position = match app.item_count() {
                0 => String::new(),
                n => format!("   {}/{}", app.offset + 1, n),
            };
            let footer = Paragraph::new(Line::from(vec![
                Span::styled(" NEWS ", Style::default().bg(UI_GREY).fg(DARK_BG).bold()),
                Span::styled("", Style::default().fg(UI_GREY).bg(BORDER_MUTED)),
                Span::styled(" [Q] BEENDEN   [↑/↓] BLÄTTERN ", Style::default().bg(BORDER_MUTED).fg(Color::White)),
                Span::styled("", Style::default().fg(BORDER_MUTED)),
                Span::raw(position),
            ]));
            frame.render_widget(footer, main_layout[1]);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
                        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
                        _ => {}
                    }
                }
            }
        }
    }

    Ok(())
}

fn create_block<'a>(title: impl Into<Span<'a>>, color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_MUTED))
        .title(title.into().patch_style(Style::default().fg(color).bold()))
}

fn render_news_block(frame: &mut Frame, area: Rect, app: &App) {
    let block = create_block(" KRYPTO-NACHRICHTEN ", NEWS_GOLD);
    let inner_width = (area.width as usize).saturating_sub(2);

    let items = match &app.view {
        None => vec![ListItem::new("   Nachrichten werden geladen...")],
        Some(NewsView::Items(items)) if items.is_empty() => {
            vec![ListItem::new("   Keine Nachrichten vorhanden.")]
        }
        Some(NewsView::Items(items)) => {
            let mut list = Vec::new();
            for (i, item) in items.iter().enumerate().skip(app.offset) {
                list.push(ListItem::new(item_lines(item, inner_width)));
                if i + 1 < items.len() {
                    list.push(ListItem::new(Line::from(vec![Span::styled(
                        "─".repeat(inner_width),
                        Style::default().fg(BORDER_MUTED),
                    )])));
                }
            }
            list
        }
        Some(view) => {
            let message = Paragraph::new(view.message().unwrap_or_default())
                .style(Style::default().fg(ERROR_RED))
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(message, area);
            return;
        }
    };

    frame.render_widget(List::new(items).block(block), area);
}

fn item_lines(item: &RenderedItem, inner_width: usize) -> Vec<Line<'static>> {
    let label_prefix = "◆ ";
    let prefix_len = label_prefix.chars().count();
    let date_len = item.formatted_date.chars().count();

    // Max width title can take: Total - date - prefix - padding
    let max_title_len = inner_width.saturating_sub(date_len + prefix_len + 2);
    let title = fit_title(&item.title, max_title_len);

    let current_content_len = prefix_len + title.chars().count() + date_len + 1;
    let padding = " ".repeat(inner_width.saturating_sub(current_content_len));

    let mut lines = vec![Line::from(vec![
        Span::styled(label_prefix, Style::default().fg(NEWS_GOLD)),
        Span::styled(title, Style::default().bold().fg(Color::White)),
        Span::raw(padding),
        Span::styled(item.formatted_date.clone(), Style::default().fg(DESC_GREY).italic()),
    ])];

    for chunk in textwrap::wrap(&item.preview_text, inner_width.max(1))
        .into_iter()
        .take(PREVIEW_LINES)
    {
        lines.push(Line::from(Span::styled(
            chunk.into_owned(),
            Style::default().fg(DESC_GREY),
        )));
    }

    lines
}

fn fit_title(title: &str, max_len: usize) -> String {
    if title.chars().count() > max_len {
        format!("{}...", title.chars().take(max_len.saturating_sub(3)).collect::<String>())
    } else {
        title.to_string()
    }
}
