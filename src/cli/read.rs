use super::Context;
use crate::error::Result;
use clap::Args;
use tracing::info;

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Spreadsheet ID, or its Drive file name with --by-name
    pub document: String,

    /// Look the document up by name in the configured Drive folder
    #[arg(long)]
    pub by_name: bool,

    /// Zero-based sheet index
    #[arg(long, default_value_t = 0)]
    pub sheet: usize,

    /// A1 range such as A1:C3
    #[arg(long, conflicts_with = "cell")]
    pub range: Option<String>,

    /// Single cell, 1-based
    #[arg(long, num_args = 2, value_names = ["ROW", "COL"])]
    pub cell: Option<Vec<u32>>,
}

pub(super) async fn execute(context: Context, args: &ReadArgs) -> Result<()> {
    let Context { config, session } = context;

    let id = match args.by_name {
        true => {
            session
                .find_document(&args.document, config.sync.drive_folder.as_deref())
                .await?
        }
        false => args.document.clone(),
    };
    session.open_document(&id).await?;
    if let Some(document) = session.current_document() {
        info!(title = %document.title, id = %document.id, "Reading document");
    }

    let output = match (&args.range, args.cell.as_deref()) {
        (_, Some(&[row, col])) => {
            serde_json::to_string_pretty(&session.get_cell(args.sheet, row, col).await?)?
        }
        (Some(range), _) => {
            serde_json::to_string_pretty(&session.get_cell_range(args.sheet, range).await?)?
        }
        _ => serde_json::to_string_pretty(&session.get_sheet(args.sheet).await?)?,
    };
    println!("{}", output);

    Ok(())
}
