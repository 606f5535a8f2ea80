/// Lower-cased ticker symbol used as the symbol index key
pub type SymbolKey = String;
