use biyete::actions::{run_actions, Action, CsvSheetAction, JsonPayloadAction};
use biyete::integrations::JsonMailbox;
use biyete::{IngestionEngine, QueryBuilder};
use extractors::{default_countries, ParseContext};
use serde_json::{json, Value};
use shared_types::DateLocale;
use std::fs;

fn message(id: &str, body: &str, unread: bool) -> Value {
    json!({
        "id": id,
        "thread_id": format!("thread-{id}"),
        "subject": "Notificación BancoEstado",
        "from_address": "notificaciones@bancoestado.cl",
        "date_sent": 1_593_270_480_000_i64,
        "body_text": body,
        "is_unread": unread,
    })
}

fn thread(id: &str, labels: &[&str], messages: Vec<Value>) -> Value {
    json!({
        "thread_id": id,
        "labels": labels,
        "messages": messages,
    })
}

fn mailbox() -> Value {
    let purchase = "Estimado cliente: se ha realizado una compra por $12.345 en ACME asociado a su tarjeta terminada en 1234 el dia 27/06/2020 a las 13:08 hrs";
    let donation = "Te informamos que hoy 13 de julio 2020, recibiste una donación.\nMonto de donación recibida: $10.000\nNombre: Fundacion Ejemplo\nRUT: 76.123.456-7\nBanco: Banco de Chile\n";
    let transfer = "Transferencia Electrónica de Fondos (TEF)\nTe informamos que hoy *21/07/2020 11:39:20*, has recibido una transferencia electrónica de fondos, de nuestro(a) cliente *MARIA SOTO*, con el siguiente detalle:\nMonto transferido: *$25.000*\n*Nombre* *:*Juan Perez *RUT* *:* 11.111.111-1 *Banco* *:* BancoEstado *N° de cuenta* *:* 123456789 *N° de operación* *:* 987654 *Comentario* *:* arriendo\n";

    json!([
        thread(
            "t-purchase",
            &["INBOX", "biyete/expense:cl-bancoestado:purchase-notifications"],
            vec![message("m-old", purchase, false), message("m-purchase", purchase, true)],
        ),
        thread(
            "t-donation",
            &["biyete/deposit:cl-bancoestado:donation-notifications"],
            vec![message("m-donation", donation, true)],
        ),
        thread(
            "t-empty",
            &["biyete/deposit:cl-bancoestado:donation-notifications"],
            vec![message("m-empty", "   ", true)],
        ),
        thread(
            "t-transfer",
            &["biyete-deposit:cl-bancoestado:transfer-notifications"],
            vec![message("m-transfer", transfer, true)],
        ),
        thread(
            "t-newsletter",
            &["INBOX"],
            vec![message("m-newsletter", purchase, true)],
        ),
    ])
}

#[test]
fn test_full_pass_over_json_mailbox() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox_path = dir.path().join("mailbox.json");
    let csv_path = dir.path().join("transactions.csv");
    let json_path = dir.path().join("payloads.jsonl");
    fs::write(&mailbox_path, serde_json::to_string(&mailbox()).unwrap()).unwrap();

    let mut source = JsonMailbox::open(&mailbox_path).unwrap();
    let context = ParseContext::new(DateLocale::Es);
    let mut emails = Vec::new();

    for country in default_countries() {
        let router = QueryBuilder::new(&country.entities).unwrap();
        let report = IngestionEngine::new(&router, &mut source, context)
            .with_window(0, 10)
            .run()
            .unwrap();

        assert_eq!(report.threads, 4);
        assert_eq!(report.messages, 4);
        assert_eq!(report.accepted, 3);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.skipped, 0);
        emails.extend(report.emails);
    }

    let ids: Vec<&str> = emails.iter().map(|e| e.message.id.as_str()).collect();
    assert_eq!(ids, vec!["m-purchase", "m-donation", "m-transfer"]);

    let transfer = emails[2].info.as_ref().unwrap();
    assert_eq!(transfer.amount, 25000.0);
    assert_eq!(transfer.comment, "arriendo");
    assert_eq!(transfer.date.formatter.format("YYYY-MM-DD HH:mm"), "2020-07-21 11:39");

    let donation = emails[1].info.as_ref().unwrap();
    assert_eq!(donation.date.formatter.format("YYYY-MM-DD"), "2020-07-13");

    // Every message that reached a parser is marked, the newsletter is not
    assert_eq!(
        source.marked(),
        ["m-purchase", "m-donation", "m-empty", "m-transfer"].map(String::from)
    );
    source.save().unwrap();

    let mut actions: Vec<Box<dyn Action>> = vec![
        Box::new(CsvSheetAction::new(&csv_path)),
        Box::new(JsonPayloadAction::to_file(&json_path).unwrap()),
    ];
    assert_eq!(run_actions(&mut actions, &emails), 0);
    drop(actions);

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][2], "12345");
    assert_eq!(&rows[0][4], "ACME");
    assert_eq!(&rows[1][8], "deposit");

    let payloads = fs::read_to_string(&json_path).unwrap();
    assert_eq!(payloads.lines().count(), 3);

    // A second pass over the saved mailbox finds nothing left to do
    let mut reopened = JsonMailbox::open(&mailbox_path).unwrap();
    let router = QueryBuilder::new(&default_countries()[0].entities).unwrap();
    let report = IngestionEngine::new(&router, &mut reopened, context)
        .with_window(0, 10)
        .run()
        .unwrap();

    assert_eq!(report.threads, 0);
    assert!(report.emails.is_empty());

    let newsletter = reopened
        .threads()
        .iter()
        .find(|t| t.thread_id == "t-newsletter")
        .unwrap();
    assert!(newsletter.messages[0].is_unread);
}
