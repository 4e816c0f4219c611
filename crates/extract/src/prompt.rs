use caixa_core::RefEntry;

use crate::resolver::ExtractionRequest;

/// Render the provider-independent extraction prompt: the message under
/// analysis, the three reference-name lists, the classification contract,
/// and the exact JSON shape expected back.
pub fn build_prompt(request: &ExtractionRequest) -> String {
    let categories = name_list(&request.categories);
    let accounts = name_list(&request.accounts);
    let clients = name_list(&request.contacts);
    let content = &request.content;

    format!(
        r#"You are a financial assistant that classifies short business messages.

Message: "{content}"

Available lists:
- Categories: [{categories}]
- Bank accounts: [{accounts}]
- Clients: [{clients}]

CLASSIFICATION RULES:

1. "sale": the message is about selling products, merchandise or services —
   customer orders, quotes, proposals. Cues: "venda", "vendeu", "pedido",
   "encomenda", "cliente comprou".
2. "transaction": the message records money received (PIX, transfer, boleto)
   -> type "income" (cues: "entrada", "recebimento", "receita", "entrou",
   "recebi") or money paid out -> type "expense" (cues: "despesa", "saiu",
   "pagamento", "paguei", "gasto", "transferi", "pix").
3. "discard": no financial information at all — casual conversation,
   greetings, questions with no monetary value.

EXTRACT:
- value: numeric amount such as "1234.56". Convert Brazilian formatting
  (1.234,56) to US (1234.56). A value with no separators such as "100002"
  means 100002.00.
- type: "income" (money received) or "expense" (money paid).
- classification: "sale", "transaction" or "discard".
- category_name: exact name from the category list. Leave empty when there
  is no exact match.
- suggested_category: when category_name is empty, a short contextual
  suggestion (e.g. "Receitas", "Produtos").
- description: full description of the event, explicitly including the
  formatted amount (R$ X,XX). E.g. "Pagamento de R$ 500,00 ref. aluguel".
- date: any date written as DD/MM/YY or DD/MM/YYYY MUST be converted to
  YYYY-MM-DD ("14/12/25" -> "2025-12-14") and overrides the current date.
- account_name: exact name from the bank account list.
- weight: weight if mentioned (number only).
- shipping: shipping cost if mentioned.
- client_name: exact client name from the list.
- seller: seller name if mentioned.
- dev_code: return code if mentioned (e.g. "Cód. Dev: 123").

Return ONLY JSON:
{{
  "value": "0.00",
  "type": "income",
  "classification": "transaction",
  "category_name": "",
  "description": "",
  "date": "",
  "account_name": "",
  "weight": "",
  "shipping": "",
  "client_name": "",
  "seller": "",
  "dev_code": "",
  "suggested_category": ""
}}"#
    )
}

fn name_list(entries: &[RefEntry]) -> String {
    entries.iter().map(|entry| entry.name.as_str()).collect::<Vec<_>>().join(", ")
}
