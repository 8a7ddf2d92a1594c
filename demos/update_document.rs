/// Example: updating a document by its external key
///
/// Indexes one document, replaces one of its fields through `update_document`
/// and checks that readers only ever see a single version of it.

use segdex::{Field, FieldValue, IndexConfig, IndexReader, IndexWriter, Query, Term};

const KEY: &str = "7gg-sg-7x1-1ds";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("segdex-update-demo");
    let config = IndexConfig::default().with_open_mode(segdex::OpenMode::Create);

    // 1. Open a writer and a reader bound to the empty index
    let writer = IndexWriter::open_in_dir(&dir, config)?;
    let reader = IndexReader::open(&writer)?;
    println!("✓ Index opened at {}", dir.display());

    // 2. First version of the document
    let doc = reader
        .retrieve_or_create(KEY)?
        .with_field(Field::integer("ft1", 10));
    writer.update_document(KEY, doc)?;
    println!("Uncommitted changes: {}", writer.has_uncommitted_changes());
    writer.commit()?;

    let reader = reader.reopen()?.unwrap_or(reader);
    report(&reader)?;

    // 3. Retrieve, replace ft1, submit again
    let doc = reader
        .retrieve_or_create(KEY)?
        .without_fields("ft1")
        .with_field(Field::integer("ft1", 20));
    writer.update_document(KEY, doc)?;
    writer.commit()?;

    let reader = reader.reopen()?.unwrap_or(reader);
    report(&reader)?;

    // 4. Close commits anything still pending and releases the lock
    writer.close()?;
    println!("✓ Writer closed");

    Ok(())
}

fn report(reader: &IndexReader) -> Result<(), Box<dyn std::error::Error>> {
    let total = reader.count(&Query::match_all())?;
    let matches = reader.count(&Query::term(Term::exact(reader.key_field(), KEY)))?;
    let ft1 = reader
        .find_by_key(KEY)?
        .map(|address| reader.doc(address))
        .transpose()?
        .and_then(|doc| doc.get("ft1").and_then(FieldValue::as_i64));

    println!(
        "generation {}: {} docs total, {} match {}, ft1 = {:?}",
        reader.generation(),
        total,
        matches,
        KEY,
        ft1
    );
    Ok(())
}
