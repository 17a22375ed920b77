use crate::catalog::categories::{format_categories_text, CategoriesOutput};
use crate::catalog::controller::Controller;
use crate::catalog::product::format_product_text;
use crate::catalog::search::format_list_text;
use crate::catalog::{product_data, CatalogApi, HttpCatalog};
use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use foodcat_core::product::filter_categories;
use foodcat_core::session::{list_output, Event, LoadState, SortKey};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Number of categories printed by the `categories` command
const CATEGORY_PAGE: usize = 30;

#[derive(Debug, clap::Parser)]
#[command(name = "browse")]
#[command(about = "Interactive catalog browsing session")]
pub struct App {}

/// One line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Search(String),
    Category(String),
    More,
    Sort(SortKey),
    Barcode(String),
    Categories(Option<String>),
    List,
    Help,
    Quit,
}

/// Parse a line typed at the prompt
pub fn parse_input(line: &str) -> std::result::Result<Input, String> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "search" | "s" => Ok(Input::Search(rest.to_string())),
        "category" | "c" => Ok(Input::Category(if rest.is_empty() {
            "all".to_string()
        } else {
            rest.to_string()
        })),
        "more" | "m" => Ok(Input::More),
        "sort" => rest.parse::<SortKey>().map(Input::Sort),
        "barcode" | "b" => Ok(Input::Barcode(rest.to_string())),
        "categories" => Ok(Input::Categories(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),
        "list" | "l" => Ok(Input::List),
        "help" | "h" | "?" => Ok(Input::Help),
        "quit" | "q" | "exit" => Ok(Input::Quit),
        other => Err(f!("Unknown command: {}. Type 'help' for a list of commands.", other)),
    }
}

pub async fn run(_app: App, global: crate::Global) -> Result<()> {
    let api = HttpCatalog::from_global(&global)?;
    let mut controller = Controller::new(api);

    eprintln!("{}", "Loading catalog...".bright_black());
    controller.dispatch(Event::Mounted).await;
    render(&controller);
    print_help();

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut line = String::new();

    loop {
        eprint!("{} ", "foodcat>".bright_cyan().bold());
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            break; // EOF
        }

        if line.trim().is_empty() {
            continue;
        }

        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(message) => {
                eprintln!("{}", message.yellow());
                continue;
            }
        };

        if global.verbose {
            eprintln!("Input: {input:?}");
        }

        if !handle_input(&mut controller, input).await? {
            break;
        }
    }

    Ok(())
}

/// Apply one input to the session, returns `false` when the session should end
async fn handle_input<C: CatalogApi>(controller: &mut Controller<C>, input: Input) -> Result<bool> {
    let event = match input {
        Input::Quit => return Ok(false),
        Input::Help => {
            print_help();
            return Ok(true);
        }
        Input::List => {
            render(controller);
            return Ok(true);
        }
        Input::Categories(filter) => {
            let categories = &controller.session().categories;
            let matching = filter_categories(categories, filter.as_deref(), Some(CATEGORY_PAGE));
            print!(
                "{}",
                format_categories_text(&CategoriesOutput {
                    total: categories.len(),
                    shown: matching.len(),
                    categories: matching,
                })
            );
            return Ok(true);
        }
        Input::More if !controller.session().can_load_more() => {
            eprintln!("{}", "No more products to load.".yellow());
            return Ok(true);
        }
        Input::Search(query) => Event::NameSearchSubmitted(query),
        Input::Category(category) => Event::CategoryChanged(category),
        Input::More => Event::LoadMore,
        Input::Sort(key) => Event::SortChanged(key),
        Input::Barcode(barcode) => Event::BarcodeSubmitted(barcode),
    };

    match controller.dispatch(event).await {
        Some(path) => show_detail(controller, &path).await,
        None => render(controller),
    }

    Ok(true)
}

async fn show_detail<C: CatalogApi>(controller: &Controller<C>, path: &str) {
    let barcode = path.rsplit('/').next().unwrap_or(path);

    match product_data(controller.api(), barcode).await {
        Ok(view) => print!("{}", format_product_text(&view)),
        Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
    }
}

fn render<C: CatalogApi>(controller: &Controller<C>) {
    let session = controller.session();

    if let LoadState::Failed(message) = &session.load {
        eprintln!("{}: {}", "Failed to load products".red().bold(), message);
        return;
    }

    print!("{}", format_list_text(&list_output(session)));
}

fn print_help() {
    println!("{}", "Commands:".bright_white().bold());
    for (command, description) in [
        ("search <text>", "Search products by name (empty text lists everything)"),
        ("category <id|all>", "Filter by category id, 'all' removes the filter"),
        ("more", "Load the next page of results"),
        ("sort <key>", "none, name_asc, name_desc, grade_asc, grade_desc"),
        ("barcode <code>", "Show the detail view for a barcode"),
        ("categories [text]", "List categories, optionally filtered"),
        ("list", "Show the current results again"),
        ("quit", "Leave the session"),
    ] {
        println!("  {:<20} {}", command.cyan(), description);
    }
    println!();
}
